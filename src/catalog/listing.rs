//! Listing-page resolution into product references.

use crate::catalog::models::{ListingTask, ProductRef};
use crate::catalog::selectors::listing;
use scraper::Html;
use tracing::{debug, warn};

/// Extracts product references from one listing page.
///
/// A page without the tile container contributes nothing; sibling pages are
/// unaffected. Tiles without a resolvable link are skipped individually.
pub fn product_refs(task: &ListingTask, html: &str) -> Vec<ProductRef> {
    let document = Html::parse_document(html);

    let tiles: Vec<_> = document.select(&listing::TILE).collect();
    if tiles.is_empty() {
        warn!("Getting: product tiles not found for url: {}", task.url);
        return Vec::new();
    }

    let mut refs = Vec::new();
    for tile in tiles {
        let href = tile
            .select(&listing::TILE_LINK)
            .next()
            .and_then(|a| a.value().attr("href"));

        match href {
            Some(url) => {
                refs.push(ProductRef { path: task.path.clone(), url: url.to_string() })
            }
            None => warn!("Getting: product link not found on listing page: {}", task.url),
        }
    }

    debug!("Getting: {} products on listing page {}", refs.len(), task.url);
    refs
}
