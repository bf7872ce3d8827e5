//! Single-product extraction command.

use crate::catalog::client::{CatalogClient, CatalogFetch};
use crate::catalog::detail::{DetailExtractor, Provenance};
use crate::catalog::models::{ProductRecord, ProductRef, TaxonomyPath};
use crate::config::Config;
use anyhow::{Context, Result};
use tracing::info;

/// Extracts records straight from product page URLs, bypassing taxonomy
/// discovery. Useful for selector debugging and spot checks.
pub struct ProductCommand {
    config: Config,
}

impl ProductCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches and extracts a single product.
    pub async fn execute(&self, url: &str, path: TaxonomyPath) -> Result<ProductRecord> {
        let client = CatalogClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_with_client(&client, url, path).await
    }

    /// Extracts a single product with a provided client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &impl CatalogFetch,
        url: &str,
        path: TaxonomyPath,
    ) -> Result<ProductRecord> {
        info!("Extracting product: {}", url);

        let extractor = DetailExtractor::new(Provenance::from_config(&self.config));
        let html = client.page(url).await?;
        let product_ref = ProductRef { path, url: url.to_string() };

        extractor.extract(client, &product_ref, &html).await.map_err(|e| {
            anyhow::anyhow!(
                "Scraping: {} for url: {} path: {}",
                e,
                product_ref.url,
                product_ref.path
            )
        })
    }

    /// Extracts multiple products, skipping the ones that fail.
    pub async fn execute_batch(
        &self,
        urls: &[String],
        path: TaxonomyPath,
    ) -> Result<Vec<ProductRecord>> {
        let client = CatalogClient::new(&self.config).context("Failed to create HTTP client")?;
        self.execute_batch_with_client(&client, urls, path).await
    }

    /// Extracts multiple products with a provided client (for testing).
    pub async fn execute_batch_with_client(
        &self,
        client: &impl CatalogFetch,
        urls: &[String],
        path: TaxonomyPath,
    ) -> Result<Vec<ProductRecord>> {
        let mut records = Vec::new();

        for url in urls {
            match self.execute_with_client(client, url, path.clone()).await {
                Ok(record) => records.push(record),
                Err(e) => eprintln!("Failed to extract {}: {}", url, e),
            }
        }

        Ok(records)
    }
}
