//! Tool-specific error types.

use thiserror::Error;

use crate::domains::storage::StorageError;

/// Result type returned by tool handlers.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced while executing a tool.
///
/// Every variant is recovered into an error envelope by the dispatcher; none
/// of them reach the protocol layer as a fault.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments were missing, malformed, or failed validation.
    #[error("{0}")]
    InvalidArguments(String),

    /// The storage backend rejected or failed the operation.
    #[error("{action}: {source}")]
    Backend {
        action: String,
        #[source]
        source: StorageError,
    },

    /// The backend result could not be serialized.
    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal error occurred (e.g. the handler panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create the standard error for a required parameter that is absent or empty.
    pub fn missing_parameter(field: &str) -> Self {
        Self::InvalidArguments(format!("Missing or invalid '{}' parameter", field))
    }

    /// Wrap a backend failure, prefixed with the action that failed.
    pub fn backend(action: impl Into<String>, source: StorageError) -> Self {
        Self::Backend {
            action: action.into(),
            source,
        }
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Errors raised by the dispatch layer itself rather than by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No tool with this name is registered.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Two definitions declared the same name.
    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),
}

impl DispatchError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "duplicate name" error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }
}
