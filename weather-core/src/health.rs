use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    category::{PerCategory, RequestCategory},
    error::{ClassifiedError, ErrorKind},
};

/// Tri-state validity of the credentials used for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyHealthRecord {
    pub category: RequestCategory,
    pub is_valid: Validity,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
    pub consecutive_failures: u32,
    /// Position in the fallback chain of the credential used last.
    pub last_credential: Option<usize>,
}

impl KeyHealthRecord {
    pub fn new(category: RequestCategory) -> Self {
        Self {
            category,
            is_valid: Validity::Unknown,
            last_checked_at: None,
            last_error_message: None,
            consecutive_failures: 0,
            last_credential: None,
        }
    }

    fn mark_healthy(&mut self, credential: usize, now: DateTime<Utc>) {
        self.is_valid = Validity::Valid;
        self.consecutive_failures = 0;
        self.last_error_message = None;
        self.last_checked_at = Some(now);
        self.last_credential = Some(credential);
    }

    fn record_failure(&mut self, credential: usize, error: &ClassifiedError, now: DateTime<Utc>) {
        self.last_checked_at = Some(now);
        self.last_credential = Some(credential);

        match error.kind() {
            ErrorKind::InvalidApiKey => {
                self.is_valid = Validity::Invalid;
                self.consecutive_failures += 1;
                self.last_error_message = Some(error.message().to_string());
            }
            ErrorKind::RateLimitExceeded => {
                self.consecutive_failures += 1;
                self.last_error_message = Some(error.message().to_string());
            }
            _ => {}
        }
    }
}

/// Per-category key health, updated after every attempt.
#[derive(Debug)]
pub struct KeyHealthTracker {
    records: Mutex<PerCategory<KeyHealthRecord>>,
}

impl Default for KeyHealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyHealthTracker {
    pub fn new() -> Self {
        Self { records: Mutex::new(PerCategory::from_fn(KeyHealthRecord::new)) }
    }

    /// Reset to healthy after a successful attempt.
    pub fn mark_healthy(&self, category: RequestCategory, credential: usize) {
        self.lock()[category].mark_healthy(credential, Utc::now());
    }

    /// Apply the health effect of a classified failure. Only key-related
    /// kinds touch the record's counters.
    pub fn record_failure(&self, category: RequestCategory, credential: usize, error: &ClassifiedError) {
        self.lock()[category].record_failure(credential, error, Utc::now());
    }

    pub fn record(&self, category: RequestCategory) -> KeyHealthRecord {
        self.lock()[category].clone()
    }

    pub fn records(&self) -> Vec<KeyHealthRecord> {
        self.lock().iter().map(|(_, record)| record.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, PerCategory<KeyHealthRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
