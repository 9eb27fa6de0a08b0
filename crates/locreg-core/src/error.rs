//! Domain error types.

use thiserror::Error;

/// Top-level error type for repository operations.
///
/// Deleting a registration id that does not exist is deliberately *not* an
/// error: backends treat it as a no-op.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named location is not one of the three fixed locations.
    #[error("unknown location: {0}")]
    UnknownLocation(String),

    /// Persisted state exists but cannot be parsed. Surfaced loudly rather
    /// than silently discarding data.
    #[error("corrupt persisted state: {0}")]
    CorruptState(String),

    /// The backend could not be reached, authenticated against, or answered
    /// within the deadline. Never retried inside the repository.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl StoreError {
    /// Shorthand for wrapping a backend error into `StorageUnavailable`.
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(err.to_string())
    }

    /// Shorthand for wrapping a parse error into `CorruptState`.
    pub fn corrupt(err: impl std::fmt::Display) -> Self {
        Self::CorruptState(err.to_string())
    }
}
