//! MCP server lifecycle management.
//!
//! The server owns the configuration snapshot, the tool dispatcher built from
//! the registry and the transport service. Construction registers the tools;
//! `start`, `wait` and `shutdown` drive the transport.
//!
//! Adding a new tool does NOT require modifying this file: tools are
//! contributed by the groups in `domains/tools/definitions/`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rmcp::model::JsonObject;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::config::Config;
use super::error::{Error, Result};
use super::handler::McpHandler;
use super::transport::{TransportResult, TransportService, TransportState};
use crate::domains::storage::SharedStorage;
use crate::domains::tools::{DispatchError, Dispatcher, ResultEnvelope, ToolPolicy, ToolRegistry};

/// Server lifecycle state. Transitions only move forward; a stopped server
/// cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Registered,
    Running,
    ShuttingDown,
    Stopped,
}

/// The MCP server.
pub struct McpServer {
    config: Arc<Config>,
    handler: McpHandler,
    transport: TransportService,
    shutdown: CancellationToken,
    state: watch::Sender<ServerState>,
}

impl McpServer {
    /// Create a server and register its tools against `storage`.
    ///
    /// Fails if two tools share a name; no partially registered server is
    /// returned.
    pub fn new(config: Config, storage: SharedStorage) -> Result<Self> {
        let config = Arc::new(config);
        let (state, _) = watch::channel(ServerState::Created);

        let policy = ToolPolicy {
            read_only: config.mcp.read_only,
        };
        let dispatcher = ToolRegistry::for_storage(storage).register_tools(policy)?;
        state.send_replace(ServerState::Registered);
        info!(
            tools = dispatcher.len(),
            read_only = policy.read_only,
            "Server initialized"
        );

        let handler = McpHandler::new(
            Arc::new(dispatcher),
            config.server.name.as_str(),
            config.server.version.as_str(),
        );
        let shutdown = CancellationToken::new();
        let transport = TransportService::new(config.transport.clone(), handler.clone(), &shutdown);

        Ok(Self {
            config,
            handler,
            transport,
            shutdown,
            state,
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.handler.dispatcher()
    }

    pub fn handler(&self) -> &McpHandler {
        &self.handler
    }

    /// Token whose cancellation makes the server drain.
    ///
    /// Signal handlers cancel a clone of this token.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Address of the HTTP listener, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }

    /// Invoke a tool directly, bypassing the transport.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> std::result::Result<ResultEnvelope, DispatchError> {
        self.dispatcher().invoke(name, arguments).await
    }

    /// Start the configured transport.
    ///
    /// A bind failure is returned here and leaves the server `Stopped`.
    #[instrument(skip(self), fields(server = %self.config.server.name))]
    pub async fn start(&self) -> Result<()> {
        self.launch(self.transport.start()).await
    }

    /// Start serving the stdio protocol over `reader`/`writer` instead of
    /// the process stdin/stdout.
    pub async fn start_with_io<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.launch(self.transport.start_with_io(reader, writer)).await
    }

    async fn launch(&self, start: impl Future<Output = TransportResult<()>>) -> Result<()> {
        let current = self.state();
        if current != ServerState::Registered {
            return Err(Error::invalid_state("start", current));
        }

        info!("Starting {} v{}", self.name(), self.version());
        if let Err(e) = start.await {
            self.state.send_replace(ServerState::Stopped);
            return Err(e.into());
        }

        self.state.send_if_modified(|state| {
            let registered = *state == ServerState::Registered;
            if registered {
                *state = ServerState::Running;
            }
            registered
        });
        Ok(())
    }

    /// Wait until the transport finishes on its own (end of input for
    /// stdio) or is shut down.
    pub async fn wait(&self) -> Result<()> {
        self.transport.wait().await?;
        Ok(())
    }

    /// Shut the server down, giving in-flight work up to `grace` to finish.
    ///
    /// Idempotent: a second call returns `Ok` and leaves the server
    /// `Stopped`.
    pub async fn shutdown(&self, grace: Duration) -> Result<()> {
        let mut previous = ServerState::Stopped;
        self.state.send_if_modified(|state| {
            previous = *state;
            match *state {
                ServerState::Created | ServerState::Registered => {
                    *state = ServerState::Stopped;
                    true
                }
                ServerState::Running => {
                    *state = ServerState::ShuttingDown;
                    true
                }
                ServerState::ShuttingDown | ServerState::Stopped => false,
            }
        });

        match previous {
            ServerState::Stopped => return Ok(()),
            ServerState::Created | ServerState::Registered => {
                self.shutdown.cancel();
                return Ok(());
            }
            ServerState::Running | ServerState::ShuttingDown => {}
        }

        info!("Shutting down {}", self.name());
        self.shutdown.cancel();
        let result = self.transport.shutdown(grace).await;
        self.state.send_replace(ServerState::Stopped);
        info!("Server stopped");

        result.map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::{TransportConfig, TransportError};
    use crate::domains::storage::InMemoryBlockStorage;
    use serde_json::json;

    fn http_config(port: u16) -> Config {
        Config {
            transport: TransportConfig::http("127.0.0.1", port),
            ..Default::default()
        }
    }

    fn server(config: Config) -> McpServer {
        McpServer::new(config, Arc::new(InMemoryBlockStorage::new())).unwrap()
    }

    #[test]
    fn test_new_registers_tools() {
        let server = server(Config::default());
        assert_eq!(server.state(), ServerState::Registered);
        assert_eq!(server.dispatcher().len(), 5);
        assert_eq!(server.transport_state(), TransportState::Idle);
    }

    #[test]
    fn test_read_only_server_hides_mutations() {
        let mut config = Config::default();
        config.mcp.read_only = true;
        let server = server(config);
        assert_eq!(server.dispatcher().tool_names(), vec!["volumes_list", "volume_get"]);
    }

    #[tokio::test]
    async fn test_backend_error_keeps_server_running() {
        let server = server(http_config(0));
        server.start().await.unwrap();
        assert_eq!(server.state(), ServerState::Running);

        let arguments = json!({ "volume_id": "abc" }).as_object().cloned().unwrap();
        let envelope = server.call_tool("volume_get", arguments).await.unwrap();
        assert!(envelope.is_error());
        assert!(envelope.text().contains("volume abc not found"));
        assert_eq!(server.state(), ServerState::Running);

        server.shutdown(Duration::from_secs(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let server = server(http_config(0));
        server.start().await.unwrap();
        assert!(server.local_addr().is_some());

        server.shutdown(Duration::from_secs(5)).await.unwrap();
        assert_eq!(server.state(), ServerState::Stopped);
        assert_eq!(server.transport_state(), TransportState::Stopped);

        server.shutdown(Duration::from_secs(5)).await.unwrap();
        assert_eq!(server.state(), ServerState::Stopped);

        let err = server.start().await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                state: ServerState::Stopped,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let server = server(Config::default());
        server.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(server.state(), ServerState::Stopped);
        assert!(server.shutdown_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_bind_failure_never_runs() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = server(http_config(port));
        let err = server.start().await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::BindError { .. })));
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn test_token_cancellation_ends_wait() {
        let server = server(http_config(0));
        server.start().await.unwrap();

        server.shutdown_token().cancel();
        server.wait().await.unwrap();

        server.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn test_stdio_read_failure_surfaces_from_wait() {
        let server = server(Config::default());
        let input = tokio_test::io::Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))
            .build();

        server
            .start_with_io(tokio::io::BufReader::new(input), tokio::io::sink())
            .await
            .unwrap();
        assert_eq!(server.state(), ServerState::Running);

        let err = server.wait().await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::IoError(_))));
        assert_eq!(server.transport_state(), TransportState::Stopped);

        server.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[tokio::test]
    async fn test_stdio_end_of_input_waits_cleanly() {
        let server = server(Config::default());
        let input: &'static [u8] = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";

        server.start_with_io(input, tokio::io::sink()).await.unwrap();
        server.wait().await.unwrap();

        server.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(server.state(), ServerState::Stopped);
    }
}
