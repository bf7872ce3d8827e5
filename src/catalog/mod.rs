//! Store-specific modules: HTTP client, selectors, pipeline stages, and
//! data models.

pub mod availability;
pub mod client;
pub mod detail;
pub mod listing;
pub mod models;
pub mod navigator;
pub mod pagination;
pub mod selectors;
pub mod variants;
pub mod watch;

pub use client::{CatalogClient, CatalogFetch, InventoryResponse};
pub use detail::{DetailExtractor, ExtractError, Provenance};
pub use models::{
    CategoryTask, ListingTask, ProductRecord, ProductRef, TaxonomyPath, VariantDescriptor,
};
pub use navigator::{Navigator, SkipRules};
pub use watch::{CollectionWatcher, TaxonomyWatch};
