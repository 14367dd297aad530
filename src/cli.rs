//! Command-line interface.
//!
//! Flags override values loaded from the environment.

use clap::{Args, Parser, Subcommand};

use crate::core::config::{Config, parse_duration_secs};
use crate::core::transport::TransportKind;

/// Command line interface for the OpenStack MCP server
#[derive(Parser, Debug)]
#[command(name = "openstack-mcp-server")]
#[command(about = "MCP server exposing OpenStack block storage tools")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the MCP server (default)
    Serve(ServeArgs),
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Transport type: stdio or http-streaming
    #[arg(long)]
    pub transport: Option<TransportKind>,

    /// Host to bind the HTTP transport to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the HTTP transport to
    #[arg(long)]
    pub port: Option<u16>,

    /// Per-request timeout for the HTTP transport, in seconds (e.g. 30 or 30s)
    #[arg(long, value_parser = parse_duration_secs)]
    pub transport_timeout: Option<u64>,

    /// Hide every tool that modifies resources
    #[arg(long)]
    pub read_only: bool,
}

impl Cli {
    /// The subcommand to run; `serve` with no overrides when omitted.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }

    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.trim().to_lowercase();
        }

        if let Some(Command::Serve(args)) = &self.command {
            args.apply(config);
        }
    }
}

impl ServeArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(kind) = self.transport {
            config.transport.kind = kind;
        }
        if let Some(host) = &self.host {
            config.transport.http.host = host.clone();
        }
        if let Some(port) = self.port {
            config.transport.http.port = port;
        }
        if let Some(secs) = self.transport_timeout {
            config.transport.http.timeout_secs = secs;
        }
        if self.read_only {
            config.mcp.read_only = true;
        }
    }
}
