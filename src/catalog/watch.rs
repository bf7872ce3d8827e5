//! Taxonomy change detection.
//!
//! The navigator hands the full raw list of top-level labels to a watcher
//! once per run, before any skip rules apply. The watcher may log a
//! structural-change warning; it never blocks the crawl.

use tracing::{debug, warn};

/// Consulted once per run with the live top-level taxonomy labels.
pub trait TaxonomyWatch: Send + Sync {
    fn check(&self, run_id: &str, labels: &[String]);
}

/// Compares the live collection labels against a known set carried over
/// from a previous run.
pub struct CollectionWatcher {
    known: Vec<String>,
}

impl CollectionWatcher {
    pub fn new(known: Vec<String>) -> Self {
        Self { known }
    }
}

impl TaxonomyWatch for CollectionWatcher {
    fn check(&self, run_id: &str, labels: &[String]) {
        if self.known.is_empty() {
            debug!("Run {}: no known collections recorded, skipping taxonomy check", run_id);
            return;
        }

        let added: Vec<&String> =
            labels.iter().filter(|l| !self.known.contains(l)).collect();
        let removed: Vec<&String> =
            self.known.iter().filter(|k| !labels.contains(k)).collect();

        if added.is_empty() && removed.is_empty() {
            debug!("Run {}: taxonomy unchanged ({} collections)", run_id, labels.len());
        } else {
            warn!(
                "Run {}: taxonomy changed - added {:?}, removed {:?}",
                run_id, added, removed
            );
        }
    }
}

/// Watcher that ignores everything.
pub struct NoopWatch;

impl TaxonomyWatch for NoopWatch {
    fn check(&self, _run_id: &str, _labels: &[String]) {}
}
