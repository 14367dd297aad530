//! Error types and handling for the MCP server.
//!
//! Each layer has its own error enum; this module unifies the ones that can
//! reach the server's caller.

use thiserror::Error;

use super::config::ConfigError;
use super::server::ServerState;
use super::transport::TransportError;
use crate::domains::tools::DispatchError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Tool registration failed while building the server.
    #[error("Construction error: {0}")]
    Construction(#[from] DispatchError),

    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport failed to start or terminated abnormally.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A lifecycle operation was called in the wrong state.
    #[error("Cannot {operation} while server is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ServerState,
    },
}

impl Error {
    pub fn invalid_state(operation: &'static str, state: ServerState) -> Self {
        Self::InvalidState { operation, state }
    }
}
