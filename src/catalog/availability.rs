//! Availability enrichment: inventory lookup with bounded retry-on-throttle.

use crate::catalog::client::CatalogFetch;
use crate::catalog::models::VariantDescriptor;
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed length of the size suffix trailing every article number. The
/// inventory endpoint is keyed by the article number with this suffix cut
/// off.
pub const SIZE_SUFFIX_LEN: usize = 3;

/// Backoff delays between throttled attempts, in seconds.
const BACKOFF_SECS: [u64; 3] = [1, 2, 5];

#[derive(Debug, Deserialize)]
struct AvailabilityPayload {
    availability: Vec<String>,
}

/// In-stock size labels for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeAvailability {
    /// Comma-joined size labels, in declaration order, duplicates kept.
    pub sizes: String,
    /// True when the reply was still throttled after the final retry or the
    /// payload did not parse; `sizes` then reflects whatever could be
    /// salvaged (possibly nothing).
    pub degraded: bool,
}

/// Derives the inventory lookup key from an article number by truncating
/// the trailing size suffix. Fails when the id cannot carry the suffix.
pub fn lookup_key(product_id: &str) -> Result<&str> {
    let tail_start = product_id
        .char_indices()
        .rev()
        .nth(SIZE_SUFFIX_LEN - 1)
        .map(|(i, _)| i)
        .filter(|&i| i > 0);

    match tail_start {
        Some(i) => Ok(&product_id[..i]),
        None => anyhow::bail!(
            "product id '{}' is too short to carry a {}-character size suffix",
            product_id,
            SIZE_SUFFIX_LEN
        ),
    }
}

/// Resolves the in-stock size labels for a product.
///
/// Queries the inventory endpoint for the truncated id; on throttling,
/// retries up to three times with 1s/2s/5s backoff, then uses the final
/// reply regardless of its status. The sleep holds only this product's
/// task; sibling chains keep crawling.
pub async fn resolve(
    fetch: &impl CatalogFetch,
    product_id: &str,
    variants: &[VariantDescriptor],
) -> Result<SizeAvailability> {
    let key = lookup_key(product_id)?;

    let mut response = fetch.availability(key).await?;
    for secs in BACKOFF_SECS {
        if !response.throttled {
            break;
        }
        debug!("Inventory throttled for {}; retrying in {}s", key, secs);
        tokio::time::sleep(Duration::from_secs(secs)).await;
        response = fetch.availability(key).await?;
    }

    let mut degraded = response.throttled;
    if degraded {
        warn!(
            "Inventory lookup for {} still throttled after {} retries; using final reply as-is",
            key,
            BACKOFF_SECS.len()
        );
    }

    let available: HashSet<String> =
        match serde_json::from_str::<AvailabilityPayload>(&response.body) {
            Ok(payload) => payload.availability.into_iter().collect(),
            Err(e) => {
                warn!(
                    "Unparseable availability payload for {} (status {}): {}",
                    key, response.status, e
                );
                degraded = true;
                HashSet::new()
            }
        };

    let labels: Vec<&str> = variants
        .iter()
        .filter(|v| available.contains(&v.code))
        .map(|v| v.size.as_str())
        .collect();

    Ok(SizeAvailability { sizes: labels.join(", "), degraded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::client::InventoryResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Mock inventory endpoint replaying canned responses and recording
    /// call instants against the (paused) test clock.
    struct MockInventory {
        responses: Mutex<VecDeque<InventoryResponse>>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl MockInventory {
        fn new(responses: Vec<InventoryResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1].1 - w[0].1).collect()
        }
    }

    #[async_trait]
    impl CatalogFetch for MockInventory {
        async fn page(&self, _url: &str) -> Result<String> {
            anyhow::bail!("not a page endpoint")
        }

        async fn availability(&self, lookup_key: &str) -> Result<InventoryResponse> {
            self.calls.lock().unwrap().push((lookup_key.to_string(), Instant::now()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("mock ran out of responses"))
        }
    }

    fn ok_body(codes: &[&str]) -> String {
        let quoted: Vec<String> = codes.iter().map(|c| format!("\"{}\"", c)).collect();
        format!(r#"{{"availability":[{}]}}"#, quoted.join(","))
    }

    fn ok_response(codes: &[&str]) -> InventoryResponse {
        InventoryResponse { throttled: false, status: 200, body: ok_body(codes) }
    }

    fn throttled_response() -> InventoryResponse {
        InventoryResponse { throttled: true, status: 403, body: "<html>denied</html>".into() }
    }

    fn make_variants() -> Vec<VariantDescriptor> {
        vec![
            VariantDescriptor { code: "0711618001002".into(), size: "S".into() },
            VariantDescriptor { code: "0711618001003".into(), size: "M".into() },
            VariantDescriptor { code: "0711618001004".into(), size: "L".into() },
        ]
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("0711618001001").unwrap(), "0711618001");
        assert_eq!(lookup_key("ab12").unwrap(), "a");
    }

    #[test]
    fn test_lookup_key_too_short_fails() {
        assert!(lookup_key("001").is_err());
        assert!(lookup_key("ab").is_err());
        assert!(lookup_key("").is_err());
    }

    #[tokio::test]
    async fn test_resolve_happy_path() {
        let mock = MockInventory::new(vec![ok_response(&["0711618001002", "0711618001004"])]);

        let sizes = resolve(&mock, "0711618001001", &make_variants()).await.unwrap();
        assert_eq!(sizes.sizes, "S, L");
        assert!(!sizes.degraded);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls.lock().unwrap()[0].0, "0711618001");
    }

    #[tokio::test]
    async fn test_resolve_no_sizes_in_stock() {
        let mock = MockInventory::new(vec![ok_response(&[])]);

        let sizes = resolve(&mock, "0711618001001", &make_variants()).await.unwrap();
        assert_eq!(sizes.sizes, "");
        assert!(!sizes.degraded);
    }

    #[tokio::test]
    async fn test_resolve_preserves_order_and_duplicates() {
        let mut variants = make_variants();
        variants.push(VariantDescriptor { code: "0711618001002".into(), size: "S".into() });

        // Availability set order must not matter
        let mock = MockInventory::new(vec![ok_response(&["0711618001003", "0711618001002"])]);

        let sizes = resolve(&mock, "0711618001001", &variants).await.unwrap();
        assert_eq!(sizes.sizes, "S, M, S");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_retries_with_backoff_then_succeeds() {
        let mock = MockInventory::new(vec![
            throttled_response(),
            throttled_response(),
            throttled_response(),
            ok_response(&["0711618001003"]),
        ]);

        let sizes = resolve(&mock, "0711618001001", &make_variants()).await.unwrap();
        assert_eq!(sizes.sizes, "M");
        assert!(!sizes.degraded);

        // Exactly 1 initial request + 3 retries, spaced 1s/2s/5s
        assert_eq!(mock.call_count(), 4);
        let gaps = mock.call_gaps();
        assert_eq!(gaps.len(), 3);
        assert_eq!(gaps[0], Duration::from_secs(1));
        assert_eq!(gaps[1], Duration::from_secs(2));
        assert_eq!(gaps[2], Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_degrades_after_exhausted_retries() {
        let mock = MockInventory::new(vec![
            throttled_response(),
            throttled_response(),
            throttled_response(),
            throttled_response(),
        ]);

        let sizes = resolve(&mock, "0711618001001", &make_variants()).await.unwrap();
        // Final reply is used regardless of status; its body does not parse
        assert_eq!(sizes.sizes, "");
        assert!(sizes.degraded);
        assert_eq!(mock.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_final_throttled_reply_with_parseable_body() {
        let mock = MockInventory::new(vec![
            throttled_response(),
            throttled_response(),
            throttled_response(),
            InventoryResponse { throttled: true, status: 403, body: ok_body(&["0711618001002"]) },
        ]);

        let sizes = resolve(&mock, "0711618001001", &make_variants()).await.unwrap();
        // Whatever the final body yields is kept, but flagged degraded
        assert_eq!(sizes.sizes, "S");
        assert!(sizes.degraded);
    }

    #[tokio::test]
    async fn test_resolve_unparseable_body_degrades() {
        let mock = MockInventory::new(vec![InventoryResponse {
            throttled: false,
            status: 200,
            body: "not json".into(),
        }]);

        let sizes = resolve(&mock, "0711618001001", &make_variants()).await.unwrap();
        assert_eq!(sizes.sizes, "");
        assert!(sizes.degraded);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_short_id_fails_loudly() {
        let mock = MockInventory::new(vec![ok_response(&[])]);

        let result = resolve(&mock, "001", &make_variants()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
        assert_eq!(mock.call_count(), 0);
    }
}
