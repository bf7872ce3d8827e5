//! cos-crawler - staged catalog crawler for the COS store
//!
//! Walks the taxonomy (collections, then categories), pages through the
//! listing endpoint, extracts one record per product, and enriches it with
//! in-stock sizes from the inventory availability endpoint.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod sink;

pub use catalog::models::{ProductRecord, TaxonomyPath};
pub use config::Config;
