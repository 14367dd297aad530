//! Configuration management for the MCP server.
//!
//! A [`Config`] is built once at startup from defaults, a `.env` file, the
//! `OSMCP_*` environment variables and finally command-line overrides. It is
//! validated before any component is constructed and never mutated
//! afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::transport::{TransportConfig, TransportKind};

/// Log levels accepted by `OSMCP_LOGGING_LEVEL` and `--log-level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and lifecycle.
    pub server: ServerConfig,

    /// Tool exposure policy.
    pub mcp: McpConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// How long shutdown waits for in-flight work, in seconds.
    pub shutdown_timeout_secs: u64,
}

/// Tool exposure policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    /// Hide every mutating tool.
    pub read_only: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug").
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "openstack-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            shutdown_timeout_secs: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Every problem found while loading or validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {}", .problems.join("; "))]
pub struct ConfigError {
    problems: Vec<String>,
}

impl ConfigError {
    pub fn new(problems: Vec<String>) -> Self {
        Self { problems }
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }
}

/// Parse a duration given in whole seconds, with an optional `s` suffix.
pub fn parse_duration_secs(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
    digits
        .parse::<u64>()
        .map_err(|_| format!("expected seconds such as '30' or '30s', got '{value}'"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `.env` and `OSMCP_*` environment variables.
    ///
    /// Unparseable values are collected and reported together. The result
    /// still needs [`Config::validate`] once overrides are applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut problems = Vec::new();

        if let Some(name) = lookup("OSMCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(value) = lookup("OSMCP_READONLY") {
            match parse_bool(&value) {
                Some(read_only) => config.mcp.read_only = read_only,
                None => problems.push(format!("OSMCP_READONLY: expected a boolean, got '{value}'")),
            }
        }

        if let Some(value) = lookup("OSMCP_TRANSPORT_TYPE") {
            match value.parse::<TransportKind>() {
                Ok(kind) => config.transport.kind = kind,
                Err(e) => problems.push(format!("OSMCP_TRANSPORT_TYPE: {e}")),
            }
        }

        if let Some(host) = lookup("OSMCP_TRANSPORT_HOST") {
            config.transport.http.host = host;
        }

        if let Some(value) = lookup("OSMCP_TRANSPORT_PORT") {
            match value.trim().parse::<u16>() {
                Ok(port) => config.transport.http.port = port,
                Err(_) => problems.push(format!(
                    "OSMCP_TRANSPORT_PORT: expected a port number, got '{value}'"
                )),
            }
        }

        if let Some(value) = lookup("OSMCP_TRANSPORT_TIMEOUT") {
            match parse_duration_secs(&value) {
                Ok(secs) => config.transport.http.timeout_secs = secs,
                Err(e) => problems.push(format!("OSMCP_TRANSPORT_TIMEOUT: {e}")),
            }
        }

        if let Some(value) = lookup("OSMCP_SHUTDOWN_TIMEOUT") {
            match parse_duration_secs(&value) {
                Ok(secs) => config.server.shutdown_timeout_secs = secs,
                Err(e) => problems.push(format!("OSMCP_SHUTDOWN_TIMEOUT: {e}")),
            }
        }

        if let Some(level) = lookup("OSMCP_LOGGING_LEVEL") {
            config.logging.level = level.trim().to_lowercase();
        }

        if problems.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::new(problems))
        }
    }

    /// Check the configuration, reporting every violation at once.
    ///
    /// HTTP settings are only checked when the HTTP transport is selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.server.name.trim().is_empty() {
            problems.push("server name must not be empty".to_string());
        }
        if self.server.shutdown_timeout_secs == 0 {
            problems.push("shutdown timeout must be positive".to_string());
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            problems.push(format!(
                "unknown log level '{}' (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.transport.kind == TransportKind::HttpStreaming {
            let http = &self.transport.http;
            if http.port == 0 {
                problems.push("transport port must be between 1 and 65535".to_string());
            }
            if http.host.trim().is_empty() {
                problems.push("transport host must not be empty".to_string());
            }
            if http.timeout_secs == 0 {
                problems.push("transport timeout must be positive".to_string());
            }
            if !http.rpc_path.starts_with('/') {
                problems.push(format!(
                    "rpc path must start with '/', got '{}'",
                    http.rpc_path
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::new(problems))
        }
    }

    /// Grace period for draining on shutdown.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}
