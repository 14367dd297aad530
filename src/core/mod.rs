//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server:
//! configuration, error handling, the protocol handler, server lifecycle
//! management and the transport layer.

pub mod config;
pub mod error;
pub mod handler;
pub mod server;
pub mod transport;

pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use handler::McpHandler;
pub use server::{McpServer, ServerState};
pub use transport::{TransportConfig, TransportKind, TransportService, TransportState};
