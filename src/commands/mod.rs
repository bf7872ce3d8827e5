//! Command implementations behind the CLI subcommands.

pub mod crawl;
pub mod product;

pub use crawl::{CrawlCommand, CrawlSummary};
pub use product::ProductCommand;
