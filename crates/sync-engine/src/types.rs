// crates/sync-engine/src/types.rs
//! Core sync types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of local edit registered with a change set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    /// Entity was created locally
    Added,
    /// Entity was removed locally
    Deleted,
    /// Entity's markers or value changed
    Modified,
}

/// Outcome of one flush
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    /// Operation groups that issued at least one request
    pub attempted: usize,
    /// Operation groups that did not fully succeed
    pub failed: usize,
    /// Entries put back into the live change set for the next flush
    pub requeued: usize,
    /// Set when nothing was sent because no project exists yet
    pub project_missing: bool,
    pub finished_at: DateTime<Utc>,
}

impl UploadReport {
    pub(crate) fn new() -> Self {
        Self {
            attempted: 0,
            failed: 0,
            requeued: 0,
            project_missing: false,
            finished_at: Utc::now(),
        }
    }

    /// Records one attempted operation group
    pub(crate) fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if !ok {
            self.failed += 1;
        }
    }

    /// Logical AND over every attempted operation; true if nothing was attempted
    pub fn is_success(&self) -> bool {
        !self.project_missing && self.failed == 0
    }

    /// Returns true if at least one request was issued
    pub fn was_attempted(&self) -> bool {
        self.attempted > 0
    }
}

/// A project as returned by the server on creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub key: String,
    pub name: String,
}

/// A downloaded project archive
#[derive(Debug, Clone)]
pub struct ProjectArchive {
    /// File name from the `Content-Disposition` header, if sent
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}
