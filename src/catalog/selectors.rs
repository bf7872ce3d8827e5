//! CSS selectors for COS store pages.
//!
//! This file contains all CSS selectors used for parsing store pages.
//! Update this file when the site changes its markup.
//!
//! **Update process**: When extraction fails, capture an HTML sample,
//! update selectors, and add a test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for the site root (taxonomy navigation).
pub mod nav {
    use super::*;

    /// Top-level collection group container.
    pub static COLLECTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.category-wrapper > div.categories").unwrap());

    /// Attribute carrying the collection label.
    pub static COLLECTION_LABEL_ATTR: &str = "data-value";

    /// Category links inside a collection group.
    pub static CATEGORY_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.category-list > a").unwrap());
}

/// Selectors for category landing and listing pages.
pub mod listing {
    use super::*;

    /// Element whose `class` attribute holds the total product count.
    /// The site stashes the number in the class attribute, not the text.
    pub static PRODUCT_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#productCount").unwrap());

    /// Attribute on [`PRODUCT_COUNT`] carrying the count.
    pub static PRODUCT_COUNT_ATTR: &str = "class";

    /// Product tile container on a listing page.
    pub static TILE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#reloadProducts > div.column").unwrap());

    /// Product link inside a tile.
    pub static TILE_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.o-product > div > div > a").unwrap());
}

/// Selectors for product detail pages.
pub mod product {
    use super::*;

    /// Raw article number (product id).
    pub static ARTICLE_NUMBER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.article-number").unwrap());

    /// Product title.
    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.title > h1").unwrap());

    /// Description paragraphs (several fragments; last one is the
    /// fabric composition).
    pub static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("div.product-description > div.description-text > p").unwrap()
    });

    /// Current price.
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.price > span.productPrice").unwrap());

    /// Struck-through original price, only present when discounted.
    pub static PRICE_DEPRECATED: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.price > span.is-deprecated").unwrap());

    /// Color dropdown control.
    pub static COLOR: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#pdpDropdown").unwrap());

    /// Attribute on [`COLOR`] carrying the color value.
    pub static COLOR_ATTR: &str = "data-value";

    /// Script block embedding the variants array literal.
    pub static VARIANTS_SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("div.content-section > div.parbase > script").unwrap()
    });

    /// Full-resolution product images.
    pub static IMAGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#mainImageList > li > div > div > img").unwrap());

    /// Attribute on [`IMAGE`] carrying the zoomed image URL.
    pub static IMAGE_ATTR: &str = "data-zoom-src";
}
