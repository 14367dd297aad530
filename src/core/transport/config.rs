//! Transport configuration types.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which transport the server runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC over stdin/stdout (default for MCP).
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST.
    HttpStreaming,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::HttpStreaming => "http-streaming",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http-streaming" => Ok(Self::HttpStreaming),
            other => Err(format!(
                "unknown transport type '{other}' (expected 'stdio' or 'http-streaming')"
            )),
        }
    }
}

/// Transport configuration options.
///
/// HTTP settings are kept even when stdio is selected so that a command-line
/// override of the transport kind does not lose values loaded from the
/// environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(rename = "type")]
    pub kind: TransportKind,

    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port number to listen on (0 picks an ephemeral port).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path for JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rpc_path() -> String {
    "/mcp".to_string()
}

fn default_cors() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl HttpConfig {
    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    pub fn stdio() -> Self {
        Self::default()
    }

    /// Create an HTTP streaming transport config.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self {
            kind: TransportKind::HttpStreaming,
            http: HttpConfig {
                host: host.into(),
                port,
                ..Default::default()
            },
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self.kind {
            TransportKind::Stdio => "STDIO (standard MCP mode)".to_string(),
            TransportKind::HttpStreaming => format!(
                "HTTP streaming on {}{}",
                self.http.address(),
                self.http.rpc_path
            ),
        }
    }

    pub fn is_stdio(&self) -> bool {
        self.kind == TransportKind::Stdio
    }
}
