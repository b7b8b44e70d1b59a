//! Fixed inter-request pacing
//!
//! Geocoder usage policies are stated as "at most one request per N ms".
//! Runs are small daily batches, so a minimum spacing between consecutive
//! calls is enough; there is no burst allowance.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces a minimum interval between consecutive `pace()` calls
pub struct RateLimiter {
    label: &'static str,
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(label: &'static str, min_interval: Duration) -> Self {
        Self {
            label,
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn from_millis(label: &'static str, min_interval_ms: u64) -> Self {
        Self::new(label, Duration::from_millis(min_interval_ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait if necessary so this call lands at least `min_interval` after
    /// the previous one
    pub async fn pace(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!(limiter = self.label, "Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}
