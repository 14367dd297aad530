//! Result envelope: the single success/error shape of every tool invocation.

use rmcp::model::{CallToolResult, Content};
use serde_json::Value;
use tracing::warn;

use super::error::ToolResult;

/// Outcome of a tool invocation as seen by the calling agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultEnvelope {
    /// Serialized result payload (compact JSON text).
    Content(String),
    /// Human-readable failure message.
    Error(String),
}

impl ResultEnvelope {
    /// Map a handler outcome to an envelope.
    ///
    /// This is the only place where tool errors are turned into envelopes.
    pub fn from_outcome(tool: &str, outcome: ToolResult<Value>) -> Self {
        match outcome {
            Ok(value) => match serde_json::to_string(&value) {
                Ok(text) => Self::Content(text),
                Err(e) => {
                    warn!(tool, error = %e, "Failed to serialize tool result");
                    Self::Error(format!("Failed to serialize result: {}", e))
                }
            },
            Err(e) => {
                warn!(tool, error = %e, "Tool returned an error");
                Self::Error(e.to_string())
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The payload or the error message.
    pub fn text(&self) -> &str {
        match self {
            Self::Content(text) | Self::Error(text) => text,
        }
    }

    /// Render as an MCP `CallToolResult` with a single text item.
    pub fn into_call_tool_result(self) -> CallToolResult {
        match self {
            Self::Content(text) => CallToolResult::success(vec![Content::text(text)]),
            Self::Error(message) => CallToolResult::error(vec![Content::text(message)]),
        }
    }
}

impl From<ResultEnvelope> for CallToolResult {
    fn from(envelope: ResultEnvelope) -> Self {
        envelope.into_call_tool_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::storage::StorageError;
    use crate::domains::tools::ToolError;
    use serde_json::json;

    #[test]
    fn test_success_is_compact_json() {
        let envelope = ResultEnvelope::from_outcome("t", Ok(json!({ "id": "abc", "size": 5 })));
        assert!(!envelope.is_error());

        let parsed: Value = serde_json::from_str(envelope.text()).unwrap();
        assert_eq!(parsed["id"], "abc");
        assert_eq!(parsed["size"], 5);
    }

    #[test]
    fn test_argument_error_maps_to_error_envelope() {
        let envelope =
            ResultEnvelope::from_outcome("t", Err(ToolError::missing_parameter("name")));
        assert_eq!(
            envelope,
            ResultEnvelope::Error("Missing or invalid 'name' parameter".to_string())
        );
    }

    #[test]
    fn test_backend_error_maps_to_error_envelope() {
        let err = ToolError::backend("Failed to get volume", StorageError::not_found("abc"));
        let envelope = ResultEnvelope::from_outcome("t", Err(err));
        assert!(envelope.is_error());
        assert!(envelope.text().contains("volume abc not found"));
    }

    #[test]
    fn test_call_tool_result_shape() {
        let result = ResultEnvelope::Error("boom".to_string()).into_call_tool_result();
        assert_eq!(result.is_error, Some(true));

        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized["isError"], true);
        assert_eq!(serialized["content"][0]["type"], "text");
        assert_eq!(serialized["content"][0]["text"], "boom");

        let ok: CallToolResult = ResultEnvelope::Content("[]".to_string()).into();
        assert_ne!(ok.is_error, Some(true));
    }
}
