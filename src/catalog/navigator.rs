//! Taxonomy discovery over the site root document.

use crate::catalog::models::{CategoryTask, TaxonomyPath};
use crate::catalog::selectors::nav;
use crate::catalog::watch::TaxonomyWatch;
use crate::config::Config;
use anyhow::Result;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, warn};

/// Immutable skip rules consulted during discovery. Labels match lowercase.
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    collections: Vec<String>,
    categories: Vec<String>,
}

impl SkipRules {
    pub fn new(collections: Vec<String>, categories: Vec<String>) -> Self {
        Self {
            collections: collections.into_iter().map(|s| s.to_lowercase()).collect(),
            categories: categories.into_iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.collections_skip.clone(), config.categories_skip.clone())
    }

    fn skip_collection(&self, label: &str) -> bool {
        self.collections.iter().any(|s| *s == label.to_lowercase())
    }

    fn skip_category(&self, label: &str) -> bool {
        self.categories.iter().any(|s| *s == label.to_lowercase())
    }
}

/// Turns the site root document into category tasks, one per surviving
/// (collection, category) pair.
pub struct Navigator {
    origin: String,
    skip: SkipRules,
    watch: Arc<dyn TaxonomyWatch>,
}

impl Navigator {
    /// Creates a navigator resolving relative links against `origin`.
    pub fn new(origin: String, skip: SkipRules, watch: Arc<dyn TaxonomyWatch>) -> Self {
        Self { origin, skip, watch }
    }

    /// Extracts category tasks from the root document.
    ///
    /// A root document without any collection group is fatal for the whole
    /// run. Every deeper absence (label, links, href) is a per-item skip.
    pub fn category_tasks(&self, html: &str, run_id: &str) -> Result<Vec<CategoryTask>> {
        let document = Html::parse_document(html);

        let groups: Vec<_> = document.select(&nav::COLLECTION).collect();
        if groups.is_empty() {
            anyhow::bail!("Browsing: collection selector matched nothing on the root document");
        }

        // Full raw label list goes to the change detector before any
        // filtering happens.
        let raw_labels: Vec<String> = groups
            .iter()
            .filter_map(|g| g.value().attr(nav::COLLECTION_LABEL_ATTR))
            .map(String::from)
            .collect();
        self.watch.check(run_id, &raw_labels);

        let mut tasks = Vec::new();

        for group in groups {
            let label = match group.value().attr(nav::COLLECTION_LABEL_ATTR) {
                Some(l) if !l.trim().is_empty() => l.trim(),
                _ => {
                    warn!("Browsing: collection label not found");
                    continue;
                }
            };

            if self.skip.skip_collection(label) {
                debug!("Browsing: skipping collection {}", label);
                continue;
            }

            let links: Vec<_> = group.select(&nav::CATEGORY_LINK).collect();
            if links.is_empty() {
                warn!("Browsing: no category links for collection {}", label);
                continue;
            }

            for cat in links {
                let name = cat.text().collect::<String>();
                let name = name.trim();
                if name.is_empty() {
                    warn!("Browsing: category label not found for collection {}", label);
                    continue;
                }

                if self.skip.skip_category(name) {
                    debug!("Browsing: skipping category {} / {}", label, name);
                    continue;
                }

                let Some(href) = cat.value().attr("href") else {
                    warn!("Browsing: category link not found for {} / {}", label, name);
                    continue;
                };

                let path = TaxonomyPath::new(label, name);
                debug!("Browsing: discovered {}", path);
                tasks.push(CategoryTask { path, url: resolve_url(&self.origin, href) });
            }
        }

        Ok(tasks)
    }
}

/// Resolves a possibly relative href against the site origin.
fn resolve_url(origin: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("{}{}", origin, href)
    } else {
        format!("{}/{}", origin, href)
    }
}
