//! Tools domain module.
//!
//! Tools are executable operations that MCP clients call by name.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `definition.rs` - `ToolDefinition`, mutability and registration policy
//! - `handlers.rs` - `ToolHandler` trait and argument helpers
//! - `registry.rs` - Domain tool groups and registry construction
//! - `dispatcher.rs` - Immutable name-to-tool routing table
//! - `envelope.rs` - Success/error result envelope
//! - `error.rs` - Tool and dispatch error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/<group>/` (e.g., `snapshot.rs`)
//! 2. Define the params struct, `execute()` and the `ToolHandler` impl
//! 3. Add `definition()` to the group's `definitions()` list
//!
//! Transports never need to change: they only see the dispatcher.

pub mod definition;
pub mod definitions;
pub mod dispatcher;
pub mod envelope;
mod error;
pub mod handlers;
pub mod registry;

pub use definition::{Mutability, ParamSpec, ToolDefinition, ToolPolicy};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use envelope::ResultEnvelope;
pub use error::{DispatchError, ToolError, ToolResult};
pub use handlers::ToolHandler;
pub use registry::{RegistrationSummary, ToolGroup, ToolRegistry};
