//! Transport error types.

use thiserror::Error;

use super::TransportState;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` called on a transport that is not idle.
    #[error("Transport cannot start from state {0:?}")]
    AlreadyStarted(TransportState),

    /// IO error during transport.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The transport task ended abnormally.
    #[error("Transport task failed: {0}")]
    TaskFailed(String),
}

impl TransportError {
    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    pub fn is_bind_error(&self) -> bool {
        matches!(self, Self::BindError { .. })
    }
}
