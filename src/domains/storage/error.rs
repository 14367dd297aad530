//! Storage backend error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors returned by a [`BlockStorage`](super::BlockStorage) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The requested volume does not exist.
    #[error("volume {0} not found")]
    NotFound(String),

    /// The operation conflicts with the current volume state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend rejected the request as invalid.
    #[error("bad request: {0}")]
    InvalidRequest(String),

    /// Authentication or authorization failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backend could not be reached or timed out.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Create a "not found" error for a volume ID.
    pub fn not_found(volume_id: impl Into<String>) -> Self {
        Self::NotFound(volume_id.into())
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}
