//! Tool handler contract and argument helpers.
//!
//! A handler follows the same three steps regardless of the operation it
//! wraps: decode and validate its arguments, perform one backend call, and
//! return the outcome as `ToolResult<Value>`. Turning that outcome into an
//! envelope is the dispatcher's job, never the handler's.

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ToolError, ToolResult};

/// Trait implemented by every tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the raw call arguments.
    async fn call(&self, arguments: JsonObject) -> ToolResult<Value>;
}

/// Decode raw call arguments into a typed parameter struct.
///
/// A required string or integer that is absent or of the wrong type decodes
/// as its zero value (`""` or `0`), so the tool's own validation reports it
/// by field name instead of failing the whole decode.
pub fn parse_arguments<P>(mut arguments: JsonObject) -> ToolResult<P>
where
    P: DeserializeOwned + JsonSchema + 'static,
{
    zero_fill_required(&cached_schema_for_type::<P>(), &mut arguments);
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(format!("Invalid arguments: {}", e)))
}

fn zero_fill_required(schema: &JsonObject, arguments: &mut JsonObject) {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return;
    };
    let properties = schema.get("properties").and_then(Value::as_object);

    for field in required.iter().filter_map(Value::as_str) {
        let kind = properties
            .and_then(|p| p.get(field))
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str);
        let current = arguments.get(field);

        let zero = match kind {
            Some("string") if !current.is_some_and(Value::is_string) => Value::from(""),
            Some("integer") if !current.is_some_and(|v| v.is_i64() || v.is_u64()) => Value::from(0),
            _ => continue,
        };
        arguments.insert(field.to_string(), zero);
    }
}

/// Reject empty or whitespace-only required string parameters.
pub fn require_non_empty(value: &str, field: &str) -> ToolResult<()> {
    if value.trim().is_empty() {
        return Err(ToolError::missing_parameter(field));
    }
    Ok(())
}

/// Serialize a backend result into the JSON value returned to the dispatcher.
pub fn to_json<T: Serialize>(value: &T) -> ToolResult<Value> {
    Ok(serde_json::to_value(value)?)
}
