//! Run counters (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording per-target outcomes
#[derive(Debug, Default)]
pub struct Metrics {
    pages_skipped: AtomicU64,
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_skipped(&self) {
        self.pages_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pages_skipped", "Metric incremented");
    }

    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pages_fetched", "Metric incremented");
    }

    pub fn page_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "pages_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub pages_skipped: u64,
    pub pages_fetched: u64,
    pub pages_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.page_skipped();
        metrics.page_fetched();
        metrics.page_fetched();
        metrics.page_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pages_skipped, 1);
        assert_eq!(snapshot.pages_fetched, 2);
        assert_eq!(snapshot.pages_failed, 1);
    }
}
