//! Global request pacing shared across all fetch workers
//!
//! The API provider rate-limits the credential, not individual tasks, so
//! pacing has to be enforced in one place: a single "earliest next send"
//! instant that every worker advances under mutual exclusion. Per-worker
//! sleeps cannot bound the aggregate request rate once concurrency > 1.

use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Process-wide send scheduler
///
/// `acquire` returns once the caller is authorized to send; any two
/// authorizations are spaced by at least the configured minimum interval.
/// Built on `tokio::time` so tests run against the paused virtual clock.
#[derive(Debug)]
pub struct Throttle {
    next_send_at: Mutex<Instant>,
    min_interval: Duration,
    jitter: Duration,
}

impl Throttle {
    /// Create a throttle; the first caller is authorized immediately.
    pub fn new(min_interval: Duration, jitter: Duration) -> Self {
        Self {
            next_send_at: Mutex::new(Instant::now()),
            min_interval,
            jitter,
        }
    }

    /// Wait for the next send slot.
    ///
    /// The lock is held across the wait so read-wait-advance is one atomic
    /// unit: no two callers can interleave between reading and updating the
    /// schedule, and the jittered gap is applied inside the same section.
    pub async fn acquire(&self) {
        let mut next_send_at = self.next_send_at.lock().await;

        let now = Instant::now();
        let wait = next_send_at.saturating_duration_since(now);
        if !wait.is_zero() {
            sleep(wait).await;
        }

        let mut gap = self.min_interval;
        if !self.jitter.is_zero() {
            // small randomization to avoid a perfect cadence
            gap += self.jitter.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        }

        *next_send_at = (*next_send_at).max(now) + gap;
    }
}
