//! HTTP streaming transport implementation.
//!
//! JSON-RPC over POST: each request body carries one message and the
//! response body carries its reply. `initialize` opens a session whose id is
//! returned in the `Mcp-Session-Id` header; later requests may present it and
//! `DELETE` on the RPC path closes it. Each connection is served on its own
//! task by hyper, so independent clients run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::handler::McpHandler;

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    handler: McpHandler,
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
    rpc_path: Arc<str>,
}

#[derive(Debug, Clone)]
struct SessionState {
    created_at: DateTime<Utc>,
    initialized: bool,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Bind the listening socket.
    pub async fn bind(&self) -> TransportResult<TcpListener> {
        let addr = self.config.address();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))
    }

    /// Build the axum router for this transport.
    pub fn router(&self, handler: McpHandler) -> Router {
        let state = AppState {
            handler,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            rpc_path: self.config.rpc_path.as_str().into(),
        };

        let mut app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc).delete(close_session))
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(self.config.request_timeout())),
            );

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Serve `app` on an already bound listener until `cancel` fires, then
    /// finish in-flight requests.
    pub async fn serve(
        &self,
        listener: TcpListener,
        app: Router,
        cancel: CancellationToken,
    ) -> TransportResult<()> {
        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        match listener.local_addr() {
            Ok(addr) => info!(
                "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
                addr, cors_status
            ),
            Err(e) => warn!("Listening address unavailable: {}", e),
        }
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await?;

        info!("HTTP transport finished");
        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.handler.name(),
        "version": state.handler.version(),
        "transport": "http-streaming",
        "endpoints": {
            "rpc": &*state.rpc_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "tools": state.handler.dispatcher().tool_names(),
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.sessions.read().await.len(),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

/// Handle one JSON-RPC message.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match McpHandler::parse_frame(&body) {
        Ok(request) => request,
        Err(response) => return Json(response).into_response(),
    };
    tracing::Span::current().record("method", request.method.as_str());

    let session = session_id(&headers).map(str::to_owned);
    let is_initialize = request.method == "initialize";

    if let Some(id) = &session {
        if !is_initialize && !state.sessions.read().await.contains_key(id) {
            warn!(session = %id, "Request for unknown session");
            return (StatusCode::NOT_FOUND, "Session not found").into_response();
        }
    }

    if request.method == "notifications/initialized" {
        if let Some(id) = &session {
            if let Some(s) = state.sessions.write().await.get_mut(id) {
                s.initialized = true;
            }
        }
    }

    let Some(response) = state.handler.handle_request(request).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    if is_initialize && !response.is_error() {
        let id = Uuid::new_v4().to_string();
        state.sessions.write().await.insert(
            id.clone(),
            SessionState {
                created_at: Utc::now(),
                initialized: false,
            },
        );
        info!(session = %id, "Session created");
        return ([(SESSION_HEADER, id)], Json(response)).into_response();
    }

    Json(response).into_response()
}

/// Terminate a session.
async fn close_session(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    let Some(id) = session_id(&headers) else {
        return StatusCode::BAD_REQUEST;
    };

    match state.sessions.write().await.remove(id) {
        Some(session) => {
            debug!(
                session = %id,
                initialized = session.initialized,
                age_secs = (Utc::now() - session.created_at).num_seconds(),
                "Session closed"
            );
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::storage::InMemoryBlockStorage;
    use crate::domains::tools::{ToolPolicy, ToolRegistry};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn handler() -> McpHandler {
        let dispatcher = ToolRegistry::for_storage(Arc::new(InMemoryBlockStorage::new()))
            .register_tools(ToolPolicy::read_write())
            .unwrap();
        McpHandler::new(Arc::new(dispatcher), "http-test", "0.0.1")
    }

    fn app() -> Router {
        HttpTransport::new(HttpConfig::default()).router(handler())
    }

    fn rpc(body: Value, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn initialize(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(rpc(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response
            .headers()
            .get(SESSION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_initialize_issues_session() {
        let app = app();
        let session = initialize(&app).await;
        assert!(Uuid::parse_str(&session).is_ok());

        let response = app
            .clone()
            .oneshot(rpc(
                json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
                Some(&session),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let response = app()
            .oneshot(rpc(
                json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
                Some("not-a-session"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_notification_is_accepted() {
        let app = app();
        let session = initialize(&app).await;
        let response = app
            .oneshot(rpc(
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                Some(&session),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_delete_closes_session() {
        let app = app();
        let session = initialize(&app).await;

        let delete = |id: String| {
            Request::builder()
                .method("DELETE")
                .uri("/mcp")
                .header(SESSION_HEADER, id)
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(delete(session.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::NO_CONTENT);

        let second = app.clone().oneshot(delete(session.clone())).await.unwrap();
        assert_eq!(second.status(), StatusCode::NOT_FOUND);

        let after = app
            .oneshot(rpc(json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}), Some(&session)))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from("{broken"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = app();
        let health = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(json_body(health).await["status"], "healthy");

        let root = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(root).await;
        assert_eq!(body["name"], "http-test");
        assert_eq!(body["endpoints"]["rpc"], "/mcp");
    }

    #[tokio::test]
    async fn test_live_server_roundtrip() {
        let transport = HttpTransport::new(HttpConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        });
        let listener = transport.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = transport.router(handler());

        let cancel = CancellationToken::new();
        let server = {
            let cancel = cancel.clone();
            tokio::spawn(async move { transport.serve(listener, app, cancel).await })
        };

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{addr}/mcp"))
            .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                          "params": {"name": "volume_create",
                                     "arguments": {"name": "live", "size": 3}}}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        let volume: Value =
            serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(volume["name"], "live");
        assert_eq!(volume["size"], 3);

        drop(client);
        cancel.cancel();
        server.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_connections_share_backend() {
        const CLIENTS: usize = 8;

        let transport = HttpTransport::new(HttpConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        });
        let listener = transport.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = transport.router(handler());

        let cancel = CancellationToken::new();
        let server = {
            let cancel = cancel.clone();
            tokio::spawn(async move { transport.serve(listener, app, cancel).await })
        };
        let url = format!("http://{addr}/mcp");

        // One client per task, so every call travels on its own connection.
        let calls = (0..CLIENTS).map(|i| {
            let url = url.clone();
            tokio::spawn(async move {
                let client = reqwest::Client::new();
                let body: Value = client
                    .post(&url)
                    .json(&json!({"jsonrpc": "2.0", "id": i, "method": "tools/call",
                                  "params": {"name": "volume_create",
                                             "arguments": {"name": format!("vol-{i}"), "size": i + 1}}}))
                    .send()
                    .await
                    .unwrap()
                    .json()
                    .await
                    .unwrap();
                body
            })
        });

        let mut ids = std::collections::HashSet::new();
        for (i, body) in futures::future::join_all(calls).await.into_iter().enumerate() {
            let body = body.unwrap();
            assert_eq!(body["jsonrpc"], "2.0");
            assert_eq!(body["id"], i);
            assert_eq!(body["result"]["isError"], false);
            let volume: Value =
                serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
            assert_eq!(volume["name"], format!("vol-{i}"));
            ids.insert(volume["id"].as_str().unwrap().to_string());
        }
        assert_eq!(ids.len(), CLIENTS);

        let client = reqwest::Client::new();
        let body: Value = client
            .post(&url)
            .json(&json!({"jsonrpc": "2.0", "id": "list", "method": "tools/call",
                          "params": {"name": "volumes_list"}}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let listed: Value =
            serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        let listed: std::collections::HashSet<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(listed, ids);

        drop(client);
        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
