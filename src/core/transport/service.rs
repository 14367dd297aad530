//! Transport service - owns the lifecycle of the configured transport.
//!
//! The service starts exactly one transport, reports its state and mediates
//! shutdown: stop accepting work, drain in-flight work up to a deadline, then
//! abort whatever is left.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::http::HttpTransport;
use super::stdio::{self, StdioTransport};
use super::{TransportConfig, TransportError, TransportKind, TransportResult};
use crate::core::handler::McpHandler;

/// Lifecycle state of a transport.
///
/// Transitions only move forward: `Idle → Starting → Running → Draining →
/// Stopped`, with `Starting → Stopped` when binding fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
    handler: McpHandler,
    cancel: CancellationToken,
    state: Arc<watch::Sender<TransportState>>,
    task: Mutex<Option<JoinHandle<TransportResult<()>>>>,
    abort: OnceLock<AbortHandle>,
    local_addr: OnceLock<SocketAddr>,
}

impl TransportService {
    /// Create a transport service. Cancelling `shutdown` (or any of its
    /// parents) makes the running transport drain.
    pub fn new(config: TransportConfig, handler: McpHandler, shutdown: &CancellationToken) -> Self {
        let (state, _) = watch::channel(TransportState::Idle);
        Self {
            config,
            handler,
            cancel: shutdown.child_token(),
            state: Arc::new(state),
            task: Mutex::new(None),
            abort: OnceLock::new(),
            local_addr: OnceLock::new(),
        }
    }

    /// Current state. An external cancellation observed while running is
    /// reported as `Draining`.
    pub fn state(&self) -> TransportState {
        let state = *self.state.borrow();
        if state == TransportState::Running && self.cancel.is_cancelled() {
            TransportState::Draining
        } else {
            state
        }
    }

    /// Address the HTTP transport is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Start the transport.
    ///
    /// For HTTP the socket is bound before this returns, so a bind failure is
    /// reported here and the transport ends in `Stopped`.
    pub async fn start(&self) -> TransportResult<()> {
        self.claim()?;
        info!("Starting transport: {}", self.config.description());

        let handle = match self.config.kind {
            TransportKind::Stdio => {
                self.spawn(StdioTransport::run(self.handler.clone(), self.cancel.clone()))
            }
            TransportKind::HttpStreaming => {
                let transport = HttpTransport::new(self.config.http.clone());
                let listener = match transport.bind().await {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!("{}", e);
                        self.state.send_replace(TransportState::Stopped);
                        return Err(e);
                    }
                };
                if let Ok(addr) = listener.local_addr() {
                    let _ = self.local_addr.set(addr);
                }
                let app = transport.router(self.handler.clone());
                let cancel = self.cancel.clone();
                self.spawn(async move { transport.serve(listener, app, cancel).await })
            }
        };

        self.launched(handle).await;
        Ok(())
    }

    /// Start the stdio protocol over `reader`/`writer` instead of the process
    /// stdin/stdout, whatever transport kind is configured.
    pub async fn start_with_io<R, W>(&self, reader: R, writer: W) -> TransportResult<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.claim()?;
        info!("Starting transport: STDIO over provided streams");

        let handle = self.spawn(stdio::serve(
            self.handler.clone(),
            reader,
            writer,
            self.cancel.clone(),
        ));
        self.launched(handle).await;
        Ok(())
    }

    /// Move `Idle → Starting`, rejecting a second start.
    fn claim(&self) -> TransportResult<()> {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if *state == TransportState::Idle {
                *state = TransportState::Starting;
                claimed = true;
            }
            claimed
        });
        if claimed {
            Ok(())
        } else {
            Err(TransportError::AlreadyStarted(self.state()))
        }
    }

    async fn launched(&self, handle: JoinHandle<TransportResult<()>>) {
        let _ = self.abort.set(handle.abort_handle());
        *self.task.lock().await = Some(handle);

        self.state.send_if_modified(|state| {
            let starting = *state == TransportState::Starting;
            if starting {
                *state = TransportState::Running;
            }
            starting
        });
    }

    fn spawn<F>(&self, transport: F) -> JoinHandle<TransportResult<()>>
    where
        F: Future<Output = TransportResult<()>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let result = transport.await;
            if let Err(e) = &result {
                error!("Transport terminated with error: {}", e);
            }
            state.send_replace(TransportState::Stopped);
            result
        })
    }

    /// Wait for the transport to finish and return its outcome.
    ///
    /// Safe to cancel: dropping the future leaves the transport running.
    pub async fn wait(&self) -> TransportResult<()> {
        let mut task = self.task.lock().await;
        let Some(handle) = task.as_mut() else {
            return Ok(());
        };

        let joined = handle.await;
        task.take();

        match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(TransportError::TaskFailed(e.to_string())),
        }
    }

    /// Stop the transport, waiting up to `grace` for in-flight work.
    ///
    /// Idempotent: returns immediately when never started or already stopped.
    pub async fn shutdown(&self, grace: Duration) -> TransportResult<()> {
        let mut state = self.state.subscribe();
        let current = *state.borrow_and_update();
        match current {
            TransportState::Stopped => return Ok(()),
            TransportState::Idle => {
                self.state.send_replace(TransportState::Stopped);
                return Ok(());
            }
            _ => {}
        }

        info!(grace_ms = grace.as_millis() as u64, "Draining transport");
        self.state.send_if_modified(|state| {
            let active = matches!(*state, TransportState::Starting | TransportState::Running);
            if active {
                *state = TransportState::Draining;
            }
            active
        });
        self.cancel.cancel();

        let drained = tokio::time::timeout(
            grace,
            state.wait_for(|s| *s == TransportState::Stopped),
        )
        .await
        .is_ok();

        if drained {
            info!("Transport drained");
        } else {
            warn!("Drain deadline exceeded, aborting transport");
            if let Some(abort) = self.abort.get() {
                abort.abort();
            }
            self.state.send_replace(TransportState::Stopped);
        }
        Ok(())
    }
}
