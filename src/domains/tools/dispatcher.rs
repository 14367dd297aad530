//! Dispatch core: owns the registered tools and routes calls by name.
//!
//! A `Dispatcher` is only obtainable from [`DispatcherBuilder::build`], so a
//! registration failure never leaves a partially populated dispatcher behind.
//! Once built it is immutable and shared behind an `Arc` by every transport.

use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{JsonObject, Tool};
use tracing::{debug, instrument, warn};

use super::definition::{ToolDefinition, ToolPolicy};
use super::envelope::ResultEnvelope;
use super::error::{DispatchError, ToolError};

/// Collects tool definitions under a fixed policy.
#[derive(Debug)]
pub struct DispatcherBuilder {
    policy: ToolPolicy,
    declared: HashSet<String>,
    tools: HashMap<String, Arc<ToolDefinition>>,
    order: Vec<String>,
}

impl DispatcherBuilder {
    /// Create an empty builder.
    pub fn new(policy: ToolPolicy) -> Self {
        Self {
            policy,
            declared: HashSet::new(),
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn policy(&self) -> ToolPolicy {
        self.policy
    }

    /// Register a definition if the policy allows it.
    ///
    /// Returns `Ok(false)` when the definition was filtered out by the
    /// read-only policy. A name already declared (registered or filtered) is
    /// rejected.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<bool, DispatchError> {
        let name = definition.name().to_string();
        if !self.declared.insert(name.clone()) {
            return Err(DispatchError::duplicate(name));
        }

        if !self.policy.allows(definition.mutability()) {
            return Ok(false);
        }

        self.order.push(name.clone());
        self.tools.insert(name, Arc::new(definition));
        Ok(true)
    }

    /// Freeze the registered tools into a dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            policy: self.policy,
            tools: self.tools,
            order: self.order,
        }
    }
}

/// Immutable name-to-tool routing table.
#[derive(Debug)]
pub struct Dispatcher {
    policy: ToolPolicy,
    tools: HashMap<String, Arc<ToolDefinition>>,
    order: Vec<String>,
}

impl Dispatcher {
    /// Start building a dispatcher.
    pub fn builder(policy: ToolPolicy) -> DispatcherBuilder {
        DispatcherBuilder::new(policy)
    }

    pub fn policy(&self) -> ToolPolicy {
        self.policy
    }

    /// Resolve a tool by exact name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Registered definitions, in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(Arc::as_ref))
    }

    /// MCP tool models for discovery, in registration order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.definitions().map(ToolDefinition::to_tool).collect()
    }

    /// Invoke a tool by name.
    ///
    /// A known tool always yields an envelope, even if its handler panics.
    /// Only an unknown name produces an error.
    #[instrument(skip(self, arguments))]
    pub async fn invoke(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<ResultEnvelope, DispatchError> {
        let Some(tool) = self.tools.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(DispatchError::not_found(name));
        };

        debug!("Invoking tool");
        let outcome = AssertUnwindSafe(tool.handler().call(arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ToolError::internal(format!("tool '{}' panicked", name))));

        Ok(ResultEnvelope::from_outcome(name, outcome))
    }
}
