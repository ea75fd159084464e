use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::category::RequestCategory;

/// Point-in-time copy of the usage counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub current: u64,
    pub forecast: u64,
    pub historical: u64,
    pub total: u64,
    pub last_reset_at: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn count(&self, category: RequestCategory) -> u64 {
        match category {
            RequestCategory::Current => self.current,
            RequestCategory::Forecast => self.forecast,
            RequestCategory::Historical => self.historical,
        }
    }
}

#[derive(Debug)]
struct Counters {
    current: u64,
    forecast: u64,
    historical: u64,
    total: u64,
    last_reset_at: DateTime<Utc>,
}

impl Counters {
    fn zeroed(now: DateTime<Utc>) -> Self {
        Self { current: 0, forecast: 0, historical: 0, total: 0, last_reset_at: now }
    }

    fn snapshot(&self, now: DateTime<Utc>) -> UsageSnapshot {
        UsageSnapshot {
            current: self.current,
            forecast: self.forecast,
            historical: self.historical,
            total: self.total,
            last_reset_at: self.last_reset_at,
            last_checked: now,
        }
    }
}

/// Count of successful upstream requests, per category and in total.
#[derive(Debug)]
pub struct UsageCounter {
    counters: Mutex<Counters>,
}

impl Default for UsageCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageCounter {
    pub fn new() -> Self {
        Self { counters: Mutex::new(Counters::zeroed(Utc::now())) }
    }

    pub fn record(&self, category: RequestCategory) {
        let mut counters = self.lock();
        match category {
            RequestCategory::Current => counters.current += 1,
            RequestCategory::Forecast => counters.forecast += 1,
            RequestCategory::Historical => counters.historical += 1,
        }
        counters.total += 1;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        self.lock().snapshot(Utc::now())
    }

    pub fn reset(&self) -> UsageSnapshot {
        let now = Utc::now();
        let mut counters = self.lock();
        *counters = Counters::zeroed(now);
        counters.snapshot(now)
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
