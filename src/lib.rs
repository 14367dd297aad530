//! OpenStack MCP Server Library
//!
//! Exposes OpenStack block storage operations as Model Context Protocol
//! tools over stdio or HTTP.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the protocol handler, server
//!   lifecycle and the transports
//! - **domains**: business logic organized by bounded contexts
//!   - **storage**: the block storage backend abstraction
//!   - **tools**: tool definitions, registry and dispatcher
//! - **cli**: command-line parsing and overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use openstack_mcp_server::core::{Config, McpServer};
//! use openstack_mcp_server::domains::storage::InMemoryBlockStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!     let grace = config.shutdown_grace();
//!     let server = McpServer::new(config, Arc::new(InMemoryBlockStorage::new()))?;
//!     server.start().await?;
//!     server.wait().await?;
//!     server.shutdown(grace).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
