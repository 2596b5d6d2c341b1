// crates/azure-ops-mcp/src/lib.rs
// ============================================================================
// Module: Azure Ops MCP
// Description: MCP server transports for the Azure Ops tool dispatcher.
// Purpose: Expose the dispatcher over stdio and HTTP with audit logging.
// Dependencies: azure-ops-core, axum, tokio
// ============================================================================

//! ## Overview
//! Azure Ops MCP wraps the core dispatcher in JSON-RPC 2.0 and serves it
//! over two interchangeable transports: Content-Length framed stdio and
//! HTTP (with SSE streaming responses on request). Every handled request is
//! recorded to an append-only operational log through the audit sinks.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod config;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::OpsAuditEvent;
pub use audit::StderrAuditSink;
pub use config::DEFAULT_AUDIT_LOG;
pub use config::ServerConfig;
pub use config::ServerTransport;
pub use server::McpServer;
pub use server::McpServerError;
