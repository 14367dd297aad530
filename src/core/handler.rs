//! MCP request handler shared by all transports.
//!
//! Transports only deframe and reframe: every JSON-RPC message goes through
//! [`McpHandler`], which answers the handful of MCP methods this server
//! supports and routes `tools/call` into the [`Dispatcher`].

use std::sync::Arc;

use rmcp::model::{JsonObject, ServerCapabilities, ServerInfo};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::transport::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::domains::tools::Dispatcher;

const INSTRUCTIONS: &str = "OpenStack block storage tools. Use volumes_list and volume_get to inspect volumes; \
     volume_create, volume_update and volume_delete are only available when the server is not read-only.";

/// Protocol-level handler wrapping the dispatcher.
#[derive(Clone)]
pub struct McpHandler {
    dispatcher: Arc<Dispatcher>,
    name: Arc<str>,
    version: Arc<str>,
}

impl McpHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, name: impl Into<Arc<str>>, version: impl Into<Arc<str>>) -> Self {
        Self {
            dispatcher,
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Parse one raw frame into a request.
    ///
    /// On failure the returned error is the response to send back.
    pub fn parse_frame(frame: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
        let value: Value = serde_json::from_slice(frame)
            .map_err(|e| JsonRpcResponse::parse_error(format!("Parse error: {e}")))?;

        let id = value.get("id").cloned();
        let request: JsonRpcRequest =
            serde_json::from_value(value).map_err(|_| JsonRpcResponse::invalid_request(id))?;

        if request.jsonrpc != "2.0" {
            return Err(JsonRpcResponse::invalid_request(request.id));
        }
        Ok(request)
    }

    /// Handle one raw frame. Returns `None` when no response is due.
    pub async fn handle_frame(&self, frame: &[u8]) -> Option<JsonRpcResponse> {
        match Self::parse_frame(frame) {
            Ok(request) => self.handle_request(request).await,
            Err(response) => {
                warn!(code = ?response.error_code(), "Rejected malformed frame");
                Some(response)
            }
        }
    }

    /// Handle a parsed request. Notifications produce no response.
    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let notification = request.is_notification();
        let id = request.id;

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.list_tools(id),
            "tools/call" => self.call_tool(id, request.params).await,
            method if method.starts_with("notifications/") => {
                debug!("Received notification: {}", method);
                return None;
            }
            method => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::method_not_found(id, method)
            }
        };

        if notification { None } else { Some(response) }
    }

    fn server_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        };
        info.server_info.name = self.name.to_string();
        info.server_info.version = self.version.to_string();
        info
    }

    fn initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Processing initialize request");
        match serde_json::to_value(self.server_info()) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
        }
    }

    fn list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        debug!(count = self.dispatcher.len(), "Listing tools");
        JsonRpcResponse::success(id, json!({ "tools": self.dispatcher.list_tools() }))
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let Some(Value::Object(mut params)) = params else {
            return JsonRpcResponse::invalid_params(id, "Missing params");
        };

        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => return JsonRpcResponse::invalid_params(id, "Missing tool name"),
        };

        let arguments = match params.remove("arguments") {
            None | Some(Value::Null) => JsonObject::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(_) => return JsonRpcResponse::invalid_params(id, "Tool arguments must be an object"),
        };

        match self.dispatcher.invoke(&name, arguments).await {
            Ok(envelope) => match serde_json::to_value(envelope.into_call_tool_result()) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
            },
            Err(e) => {
                warn!(tool = %name, "{}", e);
                JsonRpcResponse::invalid_params(id, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::jsonrpc::{
        INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    };
    use crate::domains::storage::InMemoryBlockStorage;
    use crate::domains::tools::{ToolPolicy, ToolRegistry};

    fn handler(policy: ToolPolicy) -> McpHandler {
        let dispatcher = ToolRegistry::for_storage(Arc::new(InMemoryBlockStorage::new()))
            .register_tools(policy)
            .unwrap();
        McpHandler::new(Arc::new(dispatcher), "test-server", "1.2.3")
    }

    async fn roundtrip(handler: &McpHandler, frame: Value) -> JsonRpcResponse {
        handler
            .handle_frame(frame.to_string().as_bytes())
            .await
            .expect("response expected")
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let handler = handler(ToolPolicy::read_write());
        let response = roundtrip(
            &handler,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["serverInfo"]["version"], "1.2.3");
        assert!(result["protocolVersion"].is_string());
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_respects_read_only() {
        let handler = handler(ToolPolicy::read_only());
        let response = roundtrip(&handler, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;

        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap().to_string()).collect();
        assert_eq!(names, vec!["volumes_list", "volume_get"]);
        assert_eq!(tools[0]["annotations"]["readOnlyHint"], true);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let handler = handler(ToolPolicy::read_only());
        let response = roundtrip(
            &handler,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "volume_delete", "arguments": {"volume_id": "x"}}}),
        )
        .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, INVALID_PARAMS);
        assert_eq!(error.message, "Tool not found: volume_delete");
    }

    #[tokio::test]
    async fn test_tools_call_backend_error_is_envelope() {
        let handler = handler(ToolPolicy::read_write());
        let response = roundtrip(
            &handler,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "volume_get", "arguments": {"volume_id": "abc"}}}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Failed to get volume: volume abc not found"
        );
    }

    #[tokio::test]
    async fn test_tools_call_success_is_compact_json() {
        let handler = handler(ToolPolicy::read_write());
        let response = roundtrip(
            &handler,
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                   "params": {"name": "volumes_list"}}),
        )
        .await;

        let result = response.result.unwrap();
        assert_ne!(result["isError"], true);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "[]");
    }

    #[tokio::test]
    async fn test_tools_call_rejects_bad_params() {
        let handler = handler(ToolPolicy::read_write());

        let missing = roundtrip(&handler, json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call"})).await;
        assert_eq!(missing.error_code(), Some(INVALID_PARAMS));

        let bad_args = roundtrip(
            &handler,
            json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call",
                   "params": {"name": "volumes_list", "arguments": [1, 2]}}),
        )
        .await;
        assert_eq!(bad_args.error_code(), Some(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let handler = handler(ToolPolicy::read_write());

        let parse = handler.handle_frame(b"{not json").await.unwrap();
        assert_eq!(parse.error_code(), Some(PARSE_ERROR));
        assert!(parse.id.is_none());

        let version = roundtrip(&handler, json!({"jsonrpc": "1.0", "id": 8, "method": "ping"})).await;
        assert_eq!(version.error_code(), Some(INVALID_REQUEST));
        assert_eq!(version.id, Some(json!(8)));

        let method = roundtrip(&handler, json!({"jsonrpc": "2.0", "id": 9, "method": "resources/list"})).await;
        assert_eq!(method.error_code(), Some(METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let handler = handler(ToolPolicy::read_write());
        let frame = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(handler.handle_frame(frame.as_bytes()).await.is_none());

        let ping_without_id = json!({"jsonrpc": "2.0", "method": "ping"}).to_string();
        assert!(handler.handle_frame(ping_without_id.as_bytes()).await.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let handler = handler(ToolPolicy::read_write());
        let response = roundtrip(&handler, json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(response.result, Some(json!({})));
        assert_eq!(response.id, Some(json!("p")));
    }
}
