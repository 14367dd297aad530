//! Transport layer for the MCP server.
//!
//! Two transports are available, selected once from configuration:
//! - **STDIO**: newline-delimited JSON-RPC on stdin/stdout (default for MCP)
//! - **HTTP streaming**: JSON-RPC over POST with session tracking
//!
//! Each transport only handles framing and connection lifecycle and delegates
//! message processing to [`McpHandler`](crate::core::McpHandler).

mod config;
mod error;
pub mod http;
pub mod jsonrpc;
mod service;
pub mod stdio;

pub use config::{HttpConfig, TransportConfig, TransportKind};
pub use error::{TransportError, TransportResult};
pub use service::{TransportService, TransportState};
