//! Task runner - drives each target through the fetch pipeline

use super::decode::{self, DecodeError};
use super::http::{ExtractClient, TransportError};
use crate::cache::{CacheError, CacheStore};
use crate::observability::Metrics;
use crate::throttle::Throttle;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Cache failed: {0}")]
    Cache(#[from] CacheError),
}

/// Terminal state of one successful fetch task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Cache hit, no network work performed
    Skipped,
    /// Body fetched, decoded, and persisted
    Fetched { size: usize },
}

/// One failed target with its cause
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub target: String,
    pub cause: String,
}

/// Aggregate result of a pool run
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    pub skipped: u64,
    pub fetched: u64,
    pub failed: u64,
    pub failures: Vec<FetchFailure>,
}

/// Run the fetch pipeline for a single target.
pub async fn fetch_one(
    client: &ExtractClient,
    throttle: &Throttle,
    cache: &CacheStore,
    target: &str,
) -> Result<FetchOutcome, FetchError> {
    if cache.has(target).await? {
        return Ok(FetchOutcome::Skipped);
    }

    // Acquire a global send slot before any network work
    throttle.acquire().await;

    let envelope = client.fetch(target).await?;
    let body = decode::decode(&envelope)?;

    let size = body.len();
    cache.write(target, body).await?;

    Ok(FetchOutcome::Fetched { size })
}

/// Bounded-concurrency fetch pool
///
/// Each target becomes an independent task gated by a shared semaphore;
/// the shared throttle paces sends across all of them. Failures are
/// isolated per target and collected into the summary.
pub struct FetchPool {
    client: Arc<ExtractClient>,
    throttle: Arc<Throttle>,
    cache: CacheStore,
    concurrency: usize,
}

impl FetchPool {
    pub fn new(
        client: ExtractClient,
        throttle: Throttle,
        cache: CacheStore,
        concurrency: usize,
    ) -> Self {
        Self {
            client: Arc::new(client),
            throttle: Arc::new(throttle),
            cache,
            concurrency,
        }
    }

    /// Fetch every target, at most `concurrency` in flight at once.
    pub async fn run(&self, targets: Vec<String>) -> FetchSummary {
        info!(
            targets = targets.len(),
            concurrency = self.concurrency,
            "Starting fetch run"
        );

        let metrics = Metrics::new();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for target in targets {
            let semaphore = Arc::clone(&semaphore);
            let client = Arc::clone(&self.client);
            let throttle = Arc::clone(&self.throttle);
            let cache = self.cache.clone();

            tasks.spawn(async move {
                // never closed while the pool is running
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fetch semaphore closed");
                let outcome = fetch_one(&client, &throttle, &cache, &target).await;
                (target, outcome)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((target, Ok(FetchOutcome::Skipped))) => {
                    metrics.page_skipped();
                    debug!(url = %target, "Already cached, skipped");
                }
                Ok((target, Ok(FetchOutcome::Fetched { size }))) => {
                    metrics.page_fetched();
                    info!(url = %target, size, "Fetched");
                }
                Ok((target, Err(e))) => {
                    metrics.page_failed();
                    error!(url = %target, error = %e, "Fetch failed");
                    failures.push(FetchFailure {
                        target,
                        cause: e.to_string(),
                    });
                }
                Err(e) => {
                    metrics.page_failed();
                    error!(error = %e, "Fetch task aborted");
                    failures.push(FetchFailure {
                        target: String::new(),
                        cause: e.to_string(),
                    });
                }
            }
        }

        let snapshot = metrics.snapshot();
        let summary = FetchSummary {
            skipped: snapshot.pages_skipped,
            fetched: snapshot.pages_fetched,
            failed: snapshot.pages_failed,
            failures,
        };

        info!(
            skipped = summary.skipped,
            fetched = summary.fetched,
            failed = summary.failed,
            "Fetch run complete"
        );

        summary
    }
}
