//! Domains module containing business logic organized by bounded contexts.
//!
//! - **storage**: the block storage backend abstraction the tools call into
//! - **tools**: MCP tools, their registry and the dispatcher

pub mod storage;
pub mod tools;
