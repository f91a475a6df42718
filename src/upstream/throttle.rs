//! Minimum-spacing rate limiter for outbound upstream calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between outbound upstream calls.
///
/// Both the search and recommendation paths share one instance, since they
/// compete for the same upstream rate budget. The first call never waits;
/// each call records "now" as the new last-call timestamp after any wait, so
/// spacing is measured call start to call start.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous call.
    ///
    /// The lock is held across the read-check-sleep-write sequence so
    /// concurrent callers queue up rather than racing on the timestamp.
    pub async fn throttle(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
