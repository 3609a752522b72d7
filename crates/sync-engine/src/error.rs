// crates/sync-engine/src/error.rs
//! Error types for sync operations

use measvre_core::CoreError;
use measvre_network::NetworkError;
use thiserror::Error;

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during synchronization
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport failure: no response to read
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The server reported an error
    #[error("Server error{}: {message}", status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No project key: the project was never created
    #[error("No project: create a project first")]
    NoProject,

    /// The sync worker has shut down
    #[error("Sync worker is not running")]
    WorkerStopped,

    /// A lock guarding shared state was poisoned
    #[error("Lock poisoned")]
    LockPoisoned,

    /// The measurement or snapshot is not in the inventory
    #[error("Not in inventory: {0}")]
    NotInInventory(String),

    /// Domain error
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Returns true for failures a later attempt may fix
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network(e) => e.is_retryable(),
            SyncError::Server { status, .. } => status.map_or(true, |s| s >= 500),
            _ => false,
        }
    }
}
