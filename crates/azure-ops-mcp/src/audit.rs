// crates/azure-ops-mcp/src/audit.rs
// ============================================================================
// Module: Operational Audit Logging
// Description: Structured audit events for MCP request handling.
// Purpose: Emit an append-only diagnostic log without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! One audit event is recorded per MCP request: transport, method, tool,
//! outcome, and payload sizes, serialized as a JSON line. The log is
//! append-only and diagnostic; nothing in the system ever reads it back.
//! Sinks are intentionally lightweight so deployments can route events to
//! their preferred pipeline without redesign, and the stdio transport never
//! writes to stdout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::config::ServerTransport;

// ============================================================================
// SECTION: Types
// ============================================================================

/// JSON-RPC method classification for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcMethod {
    /// `tools/list` request.
    ToolsList,
    /// `tools/call` request.
    ToolsCall,
    /// Unrecognized or malformed method.
    Other,
}

/// Request outcome classification for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The request produced a JSON-RPC result.
    Ok,
    /// The request produced a JSON-RPC error.
    Error,
}

/// MCP request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct OpsAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// JSON-RPC method classification.
    pub method: RpcMethod,
    /// Tool name when available (tools/call).
    pub tool: Option<String>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct an audit event.
pub struct OpsAuditEventParams {
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// JSON-RPC method classification.
    pub method: RpcMethod,
    /// Tool name when available (tools/call).
    pub tool: Option<String>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl OpsAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: OpsAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "mcp_request",
            timestamp_ms,
            request_id: params.request_id,
            transport: params.transport,
            method: params.method,
            tool: params.tool,
            outcome: params.outcome,
            error_code: params.error_code,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for MCP request events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &OpsAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &OpsAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &OpsAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &OpsAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        reason = "Test-only assertions favor direct unwrap/expect for clarity."
    )]

    use std::fs;

    use serde_json::Value;

    use super::*;

    /// Builds a minimal audit event for sink tests.
    fn event(tool: Option<&str>) -> OpsAuditEvent {
        OpsAuditEvent::new(OpsAuditEventParams {
            request_id: Some("1".to_string()),
            transport: ServerTransport::Stdio,
            method: RpcMethod::ToolsCall,
            tool: tool.map(str::to_string),
            outcome: RequestOutcome::Ok,
            error_code: None,
            request_bytes: 120,
            response_bytes: 256,
        })
    }

    #[test]
    fn file_sink_appends_one_json_line_per_event() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ops.log");
        let sink = FileAuditSink::new(&path).expect("open sink");
        sink.record(&event(Some("deploy_vm")));
        sink.record(&event(Some("restart_vm")));
        let contents = fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first["event"], "mcp_request");
        assert_eq!(first["tool"], "deploy_vm");
        assert_eq!(first["transport"], "stdio");
    }

    #[test]
    fn reopening_the_sink_keeps_appending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ops.log");
        {
            let sink = FileAuditSink::new(&path).expect("open sink");
            sink.record(&event(None));
        }
        {
            let sink = FileAuditSink::new(&path).expect("reopen sink");
            sink.record(&event(None));
        }
        let contents = fs::read_to_string(&path).expect("read log");
        assert_eq!(contents.lines().count(), 2);
    }
}
