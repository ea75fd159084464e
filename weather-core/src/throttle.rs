use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{Instant, sleep_until},
};

use crate::category::{PerCategory, RequestCategory};

/// Minimum spacing between two requests of the same category.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1000);

/// Per-category request pacing.
///
/// Each category owns a lock around the time its last request went out. The
/// lock is held while waiting, so callers of one category queue up behind
/// each other while other categories are never delayed.
#[derive(Debug)]
pub struct RequestThrottle {
    min_interval: Duration,
    lanes: PerCategory<Mutex<Option<Instant>>>,
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(MIN_INTERVAL)
    }
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval, lanes: PerCategory::from_fn(|_| Mutex::new(None)) }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until `category` may issue its next request and stamp the
    /// send time. Returns immediately when the interval already elapsed.
    pub async fn await_turn(&self, category: RequestCategory) {
        let mut last = self.lanes[category].lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tracing::debug!(%category, wait_ms = (ready_at - Instant::now()).as_millis() as u64, "throttling request");
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Time the last request of `category` was let through.
    pub async fn last_issued_at(&self, category: RequestCategory) -> Option<Instant> {
        *self.lanes[category].lock().await
    }
}
