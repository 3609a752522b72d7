//! Error types for the measurement domain

use thiserror::Error;

/// Result type for domain operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or editing measurements
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// The measurement kind tag is not registered
    #[error("Unknown measurement kind: {0}")]
    UnknownKind(String),

    /// A kind tag was registered twice
    #[error("Measurement kind already registered: {0}")]
    DuplicateKind(String),

    /// Wrong number of markers for the measurement kind
    #[error("{kind} requires {expected} markers, got {actual}")]
    MarkerCount {
        kind: String,
        expected: String,
        actual: usize,
    },

    /// The computed value is not a finite number
    #[error("Invalid measurement value: {0}")]
    InvalidValue(f64),
}
