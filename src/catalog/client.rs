//! HTTP client for store requests using wreq for TLS fingerprint emulation.

use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Response from the inventory availability endpoint. Carries the raw body
/// even on error statuses; the availability resolver decides what to do
/// with a throttled reply.
#[derive(Debug, Clone)]
pub struct InventoryResponse {
    /// True when the endpoint signalled rate limiting (HTTP 403).
    pub throttled: bool,
    pub status: u16,
    pub body: String,
}

/// Trait for page and inventory fetching - enables mocking for tests.
#[async_trait]
pub trait CatalogFetch: Send + Sync {
    /// Fetches a site page and returns the HTML body.
    async fn page(&self, url: &str) -> Result<String>;

    /// Queries the inventory endpoint for a truncated product id.
    /// Does not fail on throttling; see [`InventoryResponse`].
    async fn availability(&self, lookup_key: &str) -> Result<InventoryResponse>;
}

/// Store HTTP client with a fixed User-Agent, optional outbound proxy, and
/// a global politeness gate throttling request issuance across all crawl
/// chains.
pub struct CatalogClient {
    client: Client,
    user_agent: String,
    availability_url: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
    last_request: Mutex<Option<Instant>>,
}

impl CatalogClient {
    /// Creates a new client from the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            availability_url: config.availability_url.trim_end_matches('/').to_string(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            last_request: Mutex::new(None),
        })
    }

    /// Performs a GET request through the politeness gate.
    async fn get(&self, url: &str) -> Result<wreq::Response> {
        self.throttle().await;

        debug!("GET {}", url);

        self.client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", &self.user_agent)
            .header("Accept-Encoding", "gzip, deflate, br")
            .send()
            .await
            .context("Failed to send request")
    }

    /// Enforces the minimum inter-request delay. The gate is held across
    /// the sleep, so issuance is serialized globally and no chain can slip
    /// a request inside another chain's waiting period.
    async fn throttle(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };
        let min_gap = Duration::from_millis(self.delay_ms + jitter);

        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl CatalogFetch for CatalogClient {
    async fn page(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        response.text().await.context("Failed to read response body")
    }

    async fn availability(&self, lookup_key: &str) -> Result<InventoryResponse> {
        let url = format!("{}/{}.json", self.availability_url, lookup_key);
        let response = self.get(&url).await?;

        let status = response.status().as_u16();
        if status == 403 {
            warn!("Inventory endpoint throttled request for {}", lookup_key);
        }

        let body = response.text().await.context("Failed to read availability body")?;

        Ok(InventoryResponse { throttled: status == 403, status, body })
    }
}
