// crates/azure-ops-cli/src/main.rs
// ============================================================================
// Module: Azure Ops CLI Entry Point
// Description: Command-line launcher for the Azure Ops MCP server.
// Purpose: Load credentials, pick a transport, and run the server.
// Dependencies: azure-ops-arm, azure-ops-core, azure-ops-mcp, clap, tokio
// ============================================================================

//! ## Overview
//! The `azure-ops` binary wires the pieces together: credentials from the
//! environment, the ARM client, the tool dispatcher, and the MCP server on
//! the selected transport. Missing credentials are the one fatal path: the
//! process prints every missing variable name to stderr and exits with
//! status 1 before serving anything. Under the stdio transport, stdout
//! belongs to the protocol; all diagnostics go to stderr or the log file.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use azure_ops_arm::ArmClient;
use azure_ops_arm::Credentials;
use azure_ops_arm::CredentialsError;
use azure_ops_core::Dispatcher;
use azure_ops_core::ToolCatalog;
use azure_ops_mcp::DEFAULT_AUDIT_LOG;
use azure_ops_mcp::McpServer;
use azure_ops_mcp::ServerConfig;
use azure_ops_mcp::ServerTransport;
use clap::Parser;
use clap::ValueEnum;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "azure-ops", about = "Azure VM operations MCP server")]
struct Cli {
    /// Transport protocol.
    #[arg(long, value_enum, default_value_t = TransportArg::Stdio)]
    transport: TransportArg,
    /// HTTP host (ignored for stdio).
    #[arg(long, default_value = "localhost")]
    host: String,
    /// HTTP port (ignored for stdio).
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Operational log file path.
    #[arg(long, default_value = DEFAULT_AUDIT_LOG)]
    audit_log: PathBuf,
}

/// Transport selection argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportArg {
    /// Content-Length framed JSON-RPC over stdin/stdout.
    Stdio,
    /// JSON-RPC over HTTP with optional SSE streaming.
    Http,
}

impl From<TransportArg> for ServerTransport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => Self::Stdio,
            TransportArg::Http => Self::Http,
        }
    }
}

/// Fatal CLI error with a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// User-facing error message.
    message: String,
}

impl CliError {
    /// Builds an error from a user-facing message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads configuration and runs the server on the selected transport.
async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(CredentialsError::MissingEnv(missing)) => {
            for line in missing_env_report(&missing) {
                write_stderr_line(&line)
                    .map_err(|err| CliError::new(format!("stderr write failed: {err}")))?;
            }
            return Ok(ExitCode::FAILURE);
        }
    };
    let catalog = ToolCatalog::standard()
        .map_err(|err| CliError::new(format!("tool catalog invalid: {err}")))?;
    let arm = ArmClient::new(credentials)
        .map_err(|err| CliError::new(format!("arm client init failed: {err}")))?;
    let dispatcher = Dispatcher::new(catalog, Arc::new(arm));
    let config = ServerConfig {
        transport: cli.transport.into(),
        host: cli.host,
        port: cli.port,
        audit_log: Some(cli.audit_log),
        ..ServerConfig::default()
    };
    let server = McpServer::new(config, dispatcher)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Formats the missing-credentials report, one line per variable.
fn missing_env_report(missing: &[&'static str]) -> Vec<String> {
    let mut lines = vec!["Error: Missing required environment variables:".to_string()];
    for name in missing {
        lines.push(format!("  - {name}"));
    }
    lines
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
