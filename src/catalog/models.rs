//! Data models for taxonomy traversal and the emitted product record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a crawl chain inside the catalog hierarchy.
///
/// Immutable once created; cloned onto every downstream task of a chain and
/// only ever read. The subcategory level exists in the hierarchy but is not
/// partitioned by the navigator, so it stays empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyPath {
    pub collection: String,
    pub category: String,
    pub subcategory: String,
}

impl TaxonomyPath {
    /// Creates a path at the category level, with an empty subcategory.
    pub fn new(collection: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            category: category.into(),
            subcategory: String::new(),
        }
    }
}

impl fmt::Display for TaxonomyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.collection, self.category, self.subcategory)
    }
}

/// One category landing page to paginate. Produced by the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTask {
    pub path: TaxonomyPath,
    pub url: String,
}

/// One page of listing results at a fixed offset. Produced by the
/// pagination controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTask {
    pub path: TaxonomyPath,
    pub url: String,
}

/// One product page to extract. Produced by the listing resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub path: TaxonomyPath,
    pub url: String,
}

/// One purchasable size option declared on a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDescriptor {
    /// Variant code matched against the inventory availability set.
    pub code: String,
    /// Human-readable size label.
    pub size: String,
}

/// The terminal record handed to the sink. Every field is populated by the
/// time one of these exists; products with missing required values are
/// dropped before construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Target market label (e.g. "France").
    #[serde(rename = "pays")]
    pub market: String,
    pub brand: String,
    pub website: String,
    /// Collection label, upper-cased.
    pub collection: String,
    pub category: String,
    #[serde(rename = "sub_category")]
    pub subcategory: String,
    /// Raw article number from the product page.
    #[serde(rename = "id_mode_item")]
    pub product_id: String,
    #[serde(rename = "designation")]
    pub title: String,
    pub description: String,
    /// Fabric composition string.
    pub composition: String,
    /// Display price with the currency symbol stripped. Kept as text.
    pub price: String,
    /// Pre-discount price; equals `price` when no discount is shown.
    pub original_price: String,
    pub color: String,
    /// In-stock size labels, comma-joined in declaration order.
    #[serde(rename = "size")]
    pub sizes: String,
    #[serde(rename = "url_item")]
    pub url: String,
    pub image_urls: Vec<String>,
    /// Capture date, local time, `DD/MM/YYYY`.
    pub timestamp: String,
}

impl ProductRecord {
    /// Looks up a field by its wire name, for ordered column output.
    ///
    /// Names come from the configured export-field list; names the record
    /// does not know return `None` and surface as empty columns.
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "pays" => Some(self.market.clone()),
            "brand" => Some(self.brand.clone()),
            "website" => Some(self.website.clone()),
            "collection" => Some(self.collection.clone()),
            "category" => Some(self.category.clone()),
            "sub_category" => Some(self.subcategory.clone()),
            "id_mode_item" => Some(self.product_id.clone()),
            "designation" => Some(self.title.clone()),
            "description" => Some(self.description.clone()),
            "composition" => Some(self.composition.clone()),
            "price" => Some(self.price.clone()),
            "original_price" => Some(self.original_price.clone()),
            "color" => Some(self.color.clone()),
            "size" => Some(self.sizes.clone()),
            "url_item" => Some(self.url.clone()),
            "image_urls" => Some(self.image_urls.join(", ")),
            "timestamp" => Some(self.timestamp.clone()),
            _ => None,
        }
    }
}
