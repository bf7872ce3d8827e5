//! Product detail extraction into complete records.
//!
//! Extraction is fail-closed: the first missing required value aborts this
//! one product and nothing reaches the sink for it. Other products are
//! unaffected.

use crate::catalog::availability;
use crate::catalog::client::CatalogFetch;
use crate::catalog::models::{ProductRecord, ProductRef, VariantDescriptor};
use crate::catalog::selectors::product;
use crate::catalog::variants::{self, VariantsError};
use crate::config::Config;
use chrono::Local;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::warn;

/// Why a single product was dropped.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),
    #[error("variants block: {0}")]
    Variants(#[from] VariantsError),
    #[error("availability lookup failed: {0}")]
    Availability(#[source] anyhow::Error),
}

/// Static provenance stamped on every record.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub market: String,
    pub brand: String,
    pub website: String,
}

impl Provenance {
    pub fn from_config(config: &Config) -> Self {
        Self {
            market: config.market.clone(),
            brand: config.brand.clone(),
            website: config.website.clone(),
        }
    }
}

/// Turns one product document plus its taxonomy context into a complete
/// record, enriched with in-stock sizes from the inventory endpoint.
pub struct DetailExtractor {
    provenance: Provenance,
}

impl DetailExtractor {
    pub fn new(provenance: Provenance) -> Self {
        Self { provenance }
    }

    /// Extracts one product. The document is parsed up-front so nothing
    /// non-Send is held across the availability round-trip.
    pub async fn extract(
        &self,
        fetch: &impl CatalogFetch,
        product_ref: &ProductRef,
        html: &str,
    ) -> Result<ProductRecord, ExtractError> {
        let details = parse_document(html)?;

        let sizes = availability::resolve(fetch, &details.product_id, &details.variants)
            .await
            .map_err(ExtractError::Availability)?;
        if sizes.degraded {
            warn!(
                "Scraping: degraded availability for url: {} path: {}",
                product_ref.url, product_ref.path
            );
        }

        Ok(ProductRecord {
            market: self.provenance.market.clone(),
            brand: self.provenance.brand.clone(),
            website: self.provenance.website.clone(),
            collection: product_ref.path.collection.to_uppercase(),
            category: product_ref.path.category.clone(),
            subcategory: product_ref.path.subcategory.clone(),
            product_id: details.product_id,
            title: details.title,
            description: details.description,
            composition: details.composition,
            price: details.price,
            original_price: details.original_price,
            color: details.color,
            sizes: sizes.sizes,
            url: product_ref.url.clone(),
            image_urls: details.image_urls,
            timestamp: Local::now().format("%d/%m/%Y").to_string(),
        })
    }
}

/// Everything extracted from the document itself, before enrichment.
struct ProductDetails {
    product_id: String,
    title: String,
    description: String,
    composition: String,
    price: String,
    original_price: String,
    color: String,
    variants: Vec<VariantDescriptor>,
    image_urls: Vec<String>,
}

fn parse_document(html: &str) -> Result<ProductDetails, ExtractError> {
    let document = Html::parse_document(html);

    let product_id =
        first_text(&document, &product::ARTICLE_NUMBER).ok_or(ExtractError::Missing("product id"))?;

    let title = first_text(&document, &product::TITLE).ok_or(ExtractError::Missing("title"))?;

    let fragments: Vec<String> = document
        .select(&product::DESCRIPTION)
        .map(|p| clean_fragment(&p.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .collect();
    if fragments.is_empty() {
        return Err(ExtractError::Missing("description"));
    }
    let (description, composition) = split_description(&fragments)?;

    let price = first_text(&document, &product::PRICE)
        .map(|t| clean_price(&t))
        .ok_or(ExtractError::Missing("price"))?;

    // No struck-through price means no discount is running
    let original_price = first_text(&document, &product::PRICE_DEPRECATED)
        .map(|t| clean_price(&t))
        .unwrap_or_else(|| price.clone());

    let color = first_attr(&document, &product::COLOR, product::COLOR_ATTR)
        .ok_or(ExtractError::Missing("color"))?;

    let variants = parse_variants_block(&document)?;

    let image_urls: Vec<String> = document
        .select(&product::IMAGE)
        .filter_map(|img| img.value().attr(product::IMAGE_ATTR))
        .map(secure_url)
        .collect();
    if image_urls.is_empty() {
        return Err(ExtractError::Missing("images"));
    }

    Ok(ProductDetails {
        product_id,
        title,
        description,
        composition,
        price,
        original_price,
        color,
        variants,
        image_urls,
    })
}

/// Finds the script block carrying the variants array and parses it. A page
/// without the block, or with a malformed block, aborts the product.
fn parse_variants_block(document: &Html) -> Result<Vec<VariantDescriptor>, ExtractError> {
    let mut result = Err(VariantsError::BlockNotFound);
    for script in document.select(&product::VARIANTS_SCRIPT) {
        let text = script.text().collect::<String>();
        match variants::parse_variants(&text) {
            Err(VariantsError::BlockNotFound) => continue,
            other => {
                result = other;
                break;
            }
        }
    }
    Ok(result?)
}

/// First matching element's text, trimmed; empty counts as absent.
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// First matching element's attribute; empty counts as absent.
fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// Strips control characters and surrounding whitespace from a description
/// fragment.
fn clean_fragment(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string()
}

/// The final cleaned fragment is the fabric composition; everything before
/// it joins into the description body. Fewer than two fragments cannot
/// carry both and aborts the product.
fn split_description(fragments: &[String]) -> Result<(String, String), ExtractError> {
    if fragments.len() < 2 {
        return Err(ExtractError::Missing("composition"));
    }
    let composition = fragments[fragments.len() - 1].clone();
    let description = fragments[..fragments.len() - 1].join(". ");
    Ok((description, composition))
}

/// Strips the currency symbol, leaving the display price as text.
fn clean_price(raw: &str) -> String {
    raw.replace('€', "").trim().to_string()
}

/// Normalizes protocol-relative URLs to https.
fn secure_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}
