//! Pagination over category landing pages.

use crate::catalog::models::{CategoryTask, ListingTask};
use crate::catalog::selectors::listing;
use scraper::Html;
use tracing::{debug, warn};

/// Items per listing page served by the listing endpoint.
pub const PAGE_SIZE: u32 = 12;

/// Expands a category task into one listing task per page of results.
///
/// The landing page advertises its total item count; without it the
/// category contributes nothing - the total is never guessed. Offsets run
/// `0, 12, 24, …` up to and including `total`, so the trailing partial
/// page is always covered.
pub fn listing_tasks(task: &CategoryTask, html: &str) -> Vec<ListingTask> {
    let document = Html::parse_document(html);

    let raw = document
        .select(&listing::PRODUCT_COUNT)
        .next()
        .and_then(|e| e.value().attr(listing::PRODUCT_COUNT_ATTR));

    let Some(raw) = raw else {
        warn!("Getting: product count not found for url: {}", task.url);
        return Vec::new();
    };

    let total: u32 = match raw.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            warn!("Getting: unparseable product count '{}' for url: {}", raw, task.url);
            return Vec::new();
        }
    };

    debug!("Getting: {} products across {} at {}", total, task.path, task.url);

    (0..=total)
        .step_by(PAGE_SIZE as usize)
        .map(|offset| ListingTask { path: task.path.clone(), url: listing_url(&task.url, offset) })
        .collect()
}

/// Rewrites a landing URL into the listing-service endpoint at an offset.
fn listing_url(landing: &str, offset: u32) -> String {
    let base = landing.strip_suffix(".html").unwrap_or(landing);
    format!(
        "{}/_jcr_content/genericpagepar/productlisting.products.html?start={}",
        base, offset
    )
}
