//! Domain error types.

use std::time::Duration;

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A validation error in request data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The store aborted a unit of work because it conflicted with a
    /// concurrent one (serialization failure, deadlock).
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// The caller's deadline expired before a decision was reached.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl DomainError {
    /// Returns `true` when repeating the same operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_) | Self::Infrastructure(_))
    }
}
