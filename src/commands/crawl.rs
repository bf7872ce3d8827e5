//! Full catalog crawl command.

use crate::catalog::client::{CatalogClient, CatalogFetch};
use crate::catalog::detail::{DetailExtractor, Provenance};
use crate::catalog::models::{CategoryTask, ProductRecord};
use crate::catalog::navigator::{Navigator, SkipRules};
use crate::catalog::watch::CollectionWatcher;
use crate::catalog::{listing, pagination};
use crate::config::Config;
use crate::sink::{Emitter, RecordSink};
use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Counters for one finished run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlSummary {
    pub categories: usize,
    pub listing_pages: usize,
    pub products_seen: usize,
    pub records_emitted: usize,
    pub products_dropped: usize,
}

/// Per-chain counters folded into the run summary.
#[derive(Debug, Default, Clone, Copy)]
struct ChainStats {
    listing_pages: usize,
    products_seen: usize,
    products_dropped: usize,
}

/// Executes a full crawl: taxonomy discovery, pagination, listing
/// resolution, detail extraction, availability enrichment, emission.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the crawl against the live site.
    pub async fn execute(&self, sink: Box<dyn RecordSink>) -> Result<CrawlSummary> {
        let client =
            Arc::new(CatalogClient::new(&self.config).context("Failed to create HTTP client")?);
        self.execute_with(client, sink).await
    }

    /// Runs the crawl with a provided fetcher (for testing).
    pub async fn execute_with<F>(
        &self,
        fetch: Arc<F>,
        sink: Box<dyn RecordSink>,
    ) -> Result<CrawlSummary>
    where
        F: CatalogFetch + 'static,
    {
        let run_id = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let categories = self.discover_with(fetch.as_ref(), &run_id).await?;

        let mut summary = CrawlSummary { categories: categories.len(), ..Default::default() };
        info!("Run {}: {} categories to crawl", run_id, summary.categories);

        let extractor = Arc::new(DetailExtractor::new(Provenance::from_config(&self.config)));
        let (tx, mut rx) = mpsc::channel::<ProductRecord>(64);

        // One independent chain per category; chains never talk to each
        // other, records funnel into the single emitter below.
        let mut chains = Vec::with_capacity(categories.len());
        for task in categories {
            let fetch = fetch.clone();
            let extractor = extractor.clone();
            let tx = tx.clone();
            chains.push(tokio::spawn(async move {
                crawl_category(fetch.as_ref(), extractor.as_ref(), task, tx).await
            }));
        }
        drop(tx);

        let mut emitter = Emitter::new(sink);
        let mut sink_error = None;
        while let Some(record) = rx.recv().await {
            if let Err(e) = emitter.emit(&record) {
                sink_error = Some(e);
                break;
            }
        }
        // Closing the receiver fails pending sends so chains wind down
        rx.close();

        for chain in chains {
            match chain.await {
                Ok(stats) => {
                    summary.listing_pages += stats.listing_pages;
                    summary.products_seen += stats.products_seen;
                    summary.products_dropped += stats.products_dropped;
                }
                Err(e) => error!("Crawl chain panicked: {}", e),
            }
        }

        if let Some(e) = sink_error {
            return Err(e.context("Record sink failed"));
        }

        summary.records_emitted = emitter.emitted();
        info!(
            "Run {}: {} listing pages, {} products seen, {} records emitted, {} dropped",
            run_id,
            summary.listing_pages,
            summary.products_seen,
            summary.records_emitted,
            summary.products_dropped
        );

        Ok(summary)
    }

    /// Discovers category tasks without crawling them (dry run).
    pub async fn discover(&self) -> Result<Vec<CategoryTask>> {
        let client = CatalogClient::new(&self.config).context("Failed to create HTTP client")?;
        let run_id = Local::now().format("%Y%m%d-%H%M%S").to_string();
        self.discover_with(&client, &run_id).await
    }

    async fn discover_with(
        &self,
        fetch: &impl CatalogFetch,
        run_id: &str,
    ) -> Result<Vec<CategoryTask>> {
        info!("Run {}: crawling {}", run_id, self.config.start_url);

        let navigator = Navigator::new(
            self.config.site_origin(),
            SkipRules::from_config(&self.config),
            Arc::new(CollectionWatcher::new(self.config.known_collections.clone())),
        );

        let root = fetch
            .page(&self.config.start_url)
            .await
            .context("Failed to fetch the site root")?;

        navigator.category_tasks(&root, run_id)
    }
}

/// Crawls one category chain to completion: landing page, every listing
/// page, every product. All failures stay local to the smallest unit.
async fn crawl_category(
    fetch: &impl CatalogFetch,
    extractor: &DetailExtractor,
    task: CategoryTask,
    tx: mpsc::Sender<ProductRecord>,
) -> ChainStats {
    let mut stats = ChainStats::default();

    let landing = match fetch.page(&task.url).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Getting: failed to fetch category page {}: {}", task.url, e);
            return stats;
        }
    };

    for listing_task in pagination::listing_tasks(&task, &landing) {
        stats.listing_pages += 1;

        let page = match fetch.page(&listing_task.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Getting: failed to fetch listing page {}: {}", listing_task.url, e);
                continue;
            }
        };

        for product_ref in listing::product_refs(&listing_task, &page) {
            stats.products_seen += 1;

            let html = match fetch.page(&product_ref.url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Scraping: failed to fetch product {}: {}", product_ref.url, e);
                    stats.products_dropped += 1;
                    continue;
                }
            };

            match extractor.extract(fetch, &product_ref, &html).await {
                Ok(record) => {
                    if tx.send(record).await.is_err() {
                        // Emitter is gone; nothing left to do in this chain
                        return stats;
                    }
                }
                Err(e) => {
                    stats.products_dropped += 1;
                    error!(
                        "Scraping: {} for url: {} path: {}",
                        e, product_ref.url, product_ref.path
                    );
                }
            }
        }
    }

    stats
}
