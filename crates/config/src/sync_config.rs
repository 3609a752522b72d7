//! Upload timing section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts, retries and periodic flushing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Deadline for one request attempt
    pub request_timeout_secs: u64,
    /// Attempts per request, including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Flush period; unset disables periodic flushing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_flush_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5000,
            auto_flush_secs: None,
        }
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn auto_flush(&self) -> Option<Duration> {
        self.auto_flush_secs.map(Duration::from_secs)
    }
}

impl ConfigSection for SyncConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.request_timeout_secs, 1, 3600, "sync.request_timeout_secs"),
            Validator::in_range(self.max_attempts, 1, 10, "sync.max_attempts"),
            Validator::ordered(self.initial_backoff_ms, self.max_backoff_ms, "sync.initial_backoff_ms"),
        ];
        if let Some(secs) = self.auto_flush_secs {
            results.push(Validator::in_range(secs, 1, 86_400, "sync.auto_flush_secs"));
        }
        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.request_timeout_secs = other.request_timeout_secs;
        self.max_attempts = other.max_attempts;
        self.initial_backoff_ms = other.initial_backoff_ms;
        self.max_backoff_ms = other.max_backoff_ms;
        self.auto_flush_secs = other.auto_flush_secs;
    }

    fn section_name(&self) -> &'static str {
        "sync"
    }
}
