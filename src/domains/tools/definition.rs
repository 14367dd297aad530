//! Tool definitions: name, description, schema, mutability and handler.

use std::fmt;
use std::sync::Arc;

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use super::handlers::ToolHandler;

/// Whether a tool only reads state or changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    ReadOnly,
    Mutating,
}

/// Startup-time registration policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolPolicy {
    /// Suppress every `Mutating` tool.
    pub read_only: bool,
}

impl ToolPolicy {
    /// Policy that exposes every tool.
    pub fn read_write() -> Self {
        Self { read_only: false }
    }

    /// Policy that exposes only `ReadOnly` tools.
    pub fn read_only() -> Self {
        Self { read_only: true }
    }

    /// Whether a tool with the given mutability may be registered.
    pub fn allows(&self, mutability: Mutability) -> bool {
        !self.read_only || mutability == Mutability::ReadOnly
    }
}

/// One parameter as published to the calling agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Static description of one invocable tool.
///
/// The input schema is generated once from the tool's parameter struct and
/// never changes afterwards.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    mutability: Mutability,
    destructive: bool,
    input_schema: Arc<JsonObject>,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    /// Create a definition from an explicit input schema.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        mutability: Mutability,
        input_schema: Arc<JsonObject>,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            mutability,
            destructive: false,
            input_schema,
            handler: Arc::new(handler),
        }
    }

    /// Create a definition whose input schema is derived from `P`.
    pub fn for_params<P: JsonSchema + 'static>(
        name: impl Into<String>,
        description: impl Into<String>,
        mutability: Mutability,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self::new(
            name,
            description,
            mutability,
            cached_schema_for_type::<P>(),
            handler,
        )
    }

    /// Mark the tool as irreversibly destroying data.
    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn is_read_only(&self) -> bool {
        self.mutability == Mutability::ReadOnly
    }

    pub fn input_schema(&self) -> &Arc<JsonObject> {
        &self.input_schema
    }

    pub(crate) fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }

    /// Flatten the input schema into one entry per top-level property.
    pub fn parameters(&self) -> Vec<ParamSpec> {
        let required: Vec<&str> = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let Some(properties) = self.input_schema.get("properties").and_then(Value::as_object)
        else {
            return Vec::new();
        };

        properties
            .iter()
            .map(|(name, property)| ParamSpec {
                name: name.clone(),
                param_type: property_type(property),
                required: required.contains(&name.as_str()),
                description: property
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect()
    }

    /// Build the MCP `Tool` model published by `tools/list`.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: self.input_schema.clone(),
            annotations: Some(ToolAnnotations {
                title: None,
                read_only_hint: Some(self.is_read_only()),
                destructive_hint: Some(self.destructive),
                idempotent_hint: None,
                open_world_hint: Some(true),
            }),
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("mutability", &self.mutability)
            .field("destructive", &self.destructive)
            .finish_non_exhaustive()
    }
}

/// JSON Schema `type` of a property, ignoring the `null` arm of optionals.
fn property_type(property: &Value) -> String {
    match property.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("null")
            .to_string(),
        _ => "any".to_string(),
    }
}
