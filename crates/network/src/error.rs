// crates/network/src/error.rs
//! Error types for network operations

use thiserror::Error;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur during network operations
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Transport-level failure (connection refused, reset, DNS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// Resilience error
    #[error("Resilience error: {0}")]
    Resilience(#[from] measvre_resilience::ResilienceError),
}

impl NetworkError {
    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Timeout | NetworkError::Resilience(_) => true,
            NetworkError::Http(e) => !e.is_builder() && !e.is_decode(),
            NetworkError::Status { status, .. } => *status >= 500,
            NetworkError::InvalidUrl(_) => false,
        }
    }

    /// Returns true if the error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if (400..500).contains(status))
    }

    /// Returns true if the error is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if *status >= 500)
    }

    /// Body of a non-success response, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            NetworkError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
