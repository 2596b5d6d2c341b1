// crates/azure-ops-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server implementations for stdio and HTTP transports.
// Purpose: Expose the VM operation tools via JSON-RPC 2.0.
// Dependencies: azure-ops-core, axum, tokio
// ============================================================================

//! ## Overview
//! The MCP server exposes the tool dispatcher using JSON-RPC 2.0 over two
//! interchangeable transports: Content-Length framed stdio and HTTP. The
//! HTTP transport answers with plain JSON, or with a single-event SSE stream
//! when the client asks for `text/event-stream`. Tool-level failures are
//! never JSON-RPC errors; the dispatcher terminates every call in a result
//! envelope, and only protocol-level problems (bad framing, unknown
//! methods, malformed params) surface as error objects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::ACCEPT;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::routing::post;
use azure_ops_core::Dispatcher;
use azure_ops_core::ResultEnvelope;
use azure_ops_core::ToolDefinition;
use azure_ops_core::ToolName;
use azure_ops_core::ToolSurface;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::OpsAuditEvent;
use crate::audit::OpsAuditEventParams;
use crate::audit::RequestOutcome;
use crate::audit::RpcMethod;
use crate::config::ServerConfig;
use crate::config::ServerTransport;

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server configuration.
    config: ServerConfig,
    /// Tool dispatcher shared by all requests.
    dispatcher: Arc<Dispatcher>,
    /// Audit sink receiving one event per request.
    audit: Arc<dyn AuditSink>,
}

impl McpServer {
    /// Builds a new MCP server from configuration and a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration or log setup fails.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let audit: Arc<dyn AuditSink> = match &config.audit_log {
            Some(path) => Arc::new(
                FileAuditSink::new(path).map_err(|err| McpServerError::Init(err.to_string()))?,
            ),
            None => Arc::new(NoopAuditSink),
        };
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
            audit,
        })
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        match self.config.transport {
            ServerTransport::Stdio => serve_stdio(
                self.dispatcher.as_ref(),
                self.audit.as_ref(),
                self.config.max_body_bytes,
            ),
            ServerTransport::Http => serve_http(self.config, self.dispatcher, self.audit).await,
        }
    }
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Serves JSON-RPC requests over stdin/stdout until the peer closes.
fn serve_stdio(
    dispatcher: &Dispatcher,
    audit: &dyn AuditSink,
    max_body_bytes: usize,
) -> Result<(), McpServerError> {
    let mut reader = BufReader::new(std::io::stdin());
    let mut writer = std::io::stdout();
    loop {
        let Some(bytes) = read_framed(&mut reader, max_body_bytes)? else {
            return Ok(());
        };
        let (_, response, meta) = handle_raw(dispatcher, &bytes);
        let payload = serde_json::to_vec(&response)
            .map_err(|_| McpServerError::Transport("json-rpc serialization failed".to_string()))?;
        audit.record(&audit_event(
            ServerTransport::Stdio,
            &response,
            &meta,
            bytes.len(),
            payload.len(),
        ));
        write_framed(&mut writer, &payload)?;
    }
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Shared server state for HTTP handlers.
struct HttpState {
    /// Tool dispatcher shared by all requests.
    dispatcher: Arc<Dispatcher>,
    /// Audit sink receiving one event per request.
    audit: Arc<dyn AuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Serves JSON-RPC requests over HTTP.
async fn serve_http(
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    audit: Arc<dyn AuditSink>,
) -> Result<(), McpServerError> {
    let addr: SocketAddr = tokio::net::lookup_host(config.bind_address())
        .await
        .map_err(|_| McpServerError::Config("invalid bind address".to_string()))?
        .next()
        .ok_or_else(|| McpServerError::Config("bind address did not resolve".to_string()))?;
    let state = Arc::new(HttpState {
        dispatcher,
        audit,
        max_body_bytes: config.max_body_bytes,
    });
    let app = Router::new().route("/rpc", post(handle_http)).with_state(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|_| McpServerError::Transport("http bind failed".to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|_| McpServerError::Transport("http server failed".to_string()))
}

/// Handles HTTP JSON-RPC requests, streaming when the client asks for SSE.
async fn handle_http(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    let (status, response, meta) = if bytes.len() > state.max_body_bytes {
        oversized_response()
    } else {
        handle_raw(&state.dispatcher, bytes.as_ref())
    };
    let response_bytes = serde_json::to_string(&response).map_or(0, |payload| payload.len());
    state.audit.record(&audit_event(
        ServerTransport::Http,
        &response,
        &meta,
        bytes.len(),
        response_bytes,
    ));
    if wants_event_stream(&headers) {
        return sse_response(&response);
    }
    (status, axum::Json(response)).into_response()
}

/// Returns true when the client asked for an SSE streaming response.
fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}

/// Renders a JSON-RPC response as a single-event SSE stream.
fn sse_response(response: &JsonRpcResponse) -> Response {
    let payload = serde_json::to_string(response).unwrap_or_else(|_| {
        "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32060,\"message\":\"serialization \
         failed\"}}"
            .to_string()
    });
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(1);
    let _ = tx.try_send(Ok(Event::default().data(payload)));
    Sse::new(ReceiverStream::new(rx)).into_response()
}

/// Builds the payload-too-large protocol response.
fn oversized_response() -> (StatusCode, JsonRpcResponse, RequestMeta) {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        error_response(Value::Null, -32070, "request body too large"),
        RequestMeta {
            request_id: None,
            method: RpcMethod::Other,
            tool: None,
        },
    )
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier.
    id: Value,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Returns the JSON-RPC error code, when the response is an error.
    pub(crate) fn error_code(&self) -> Option<i64> {
        self.error.as_ref().map(|error| error.code)
    }

    /// Returns the result payload, when the response succeeded.
    #[cfg(test)]
    pub(crate) const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Tool call response payload.
#[derive(Debug, Serialize)]
struct ToolCallResult {
    /// Tool output content.
    content: Vec<ToolContent>,
}

/// Tool output payloads for JSON-RPC responses.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ToolContent {
    /// Free-text tool output.
    Text {
        /// Human-readable message.
        text: String,
    },
    /// JSON tool output.
    Json {
        /// JSON payload.
        json: Value,
    },
}

/// Request facts recorded for the audit log.
pub(crate) struct RequestMeta {
    /// Request identifier when provided.
    request_id: Option<String>,
    /// JSON-RPC method classification.
    method: RpcMethod,
    /// Tool name when available.
    tool: Option<String>,
}

/// Parses raw request bytes and dispatches the call.
pub(crate) fn handle_raw(
    dispatcher: &Dispatcher,
    bytes: &[u8],
) -> (StatusCode, JsonRpcResponse, RequestMeta) {
    match serde_json::from_slice::<JsonRpcRequest>(bytes) {
        Ok(request) => handle_request(dispatcher, request),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            error_response(Value::Null, -32600, "invalid json-rpc request"),
            RequestMeta {
                request_id: None,
                method: RpcMethod::Other,
                tool: None,
            },
        ),
    }
}

/// Dispatches a JSON-RPC request to the tool dispatcher.
pub(crate) fn handle_request(
    dispatcher: &Dispatcher,
    request: JsonRpcRequest,
) -> (StatusCode, JsonRpcResponse, RequestMeta) {
    let request_id = match &request.id {
        Value::Null => None,
        id => Some(id.to_string()),
    };
    if request.jsonrpc != "2.0" {
        return (
            StatusCode::BAD_REQUEST,
            error_response(request.id, -32600, "invalid json-rpc version"),
            RequestMeta {
                request_id,
                method: RpcMethod::Other,
                tool: None,
            },
        );
    }
    match request.method.as_str() {
        "tools/list" => {
            let tools = dispatcher.catalog().definitions();
            let meta = RequestMeta {
                request_id,
                method: RpcMethod::ToolsList,
                tool: None,
            };
            match serde_json::to_value(ToolListResult {
                tools,
            }) {
                Ok(value) => (StatusCode::OK, result_response(request.id, value), meta),
                Err(_) => (
                    StatusCode::OK,
                    error_response(request.id, -32060, "serialization failed"),
                    meta,
                ),
            }
        }
        "tools/call" => {
            let id = request.id;
            let params = request.params.unwrap_or(Value::Null);
            match serde_json::from_value::<ToolCallParams>(params) {
                Ok(call) => {
                    let meta = RequestMeta {
                        request_id,
                        method: RpcMethod::ToolsCall,
                        tool: Some(call.name.clone()),
                    };
                    let envelope = dispatch_blocking(dispatcher, &call.name, &call.arguments);
                    let content = envelope_content(&call.name, envelope);
                    match serde_json::to_value(ToolCallResult {
                        content: vec![content],
                    }) {
                        Ok(value) => (StatusCode::OK, result_response(id, value), meta),
                        Err(_) => (
                            StatusCode::OK,
                            error_response(id, -32060, "serialization failed"),
                            meta,
                        ),
                    }
                }
                Err(_) => (
                    StatusCode::BAD_REQUEST,
                    error_response(id, -32602, "invalid tool params"),
                    RequestMeta {
                        request_id,
                        method: RpcMethod::ToolsCall,
                        tool: None,
                    },
                ),
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            error_response(request.id, -32601, "method not found"),
            RequestMeta {
                request_id,
                method: RpcMethod::Other,
                tool: None,
            },
        ),
    }
}

/// Executes a tool call, shifting to a blocking context when available.
fn dispatch_blocking(dispatcher: &Dispatcher, name: &str, arguments: &Value) -> ResultEnvelope {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| dispatcher.dispatch(name, arguments))
        }
        _ => dispatcher.dispatch(name, arguments),
    }
}

/// Renders an envelope as tool content according to the tool's surface.
fn envelope_content(tool_name: &str, envelope: ResultEnvelope) -> ToolContent {
    let surface = ToolName::parse(tool_name).map(ToolName::surface);
    match surface {
        Some(ToolSurface::Json) => {
            let json = envelope
                .data
                .clone()
                .unwrap_or_else(|| serde_json::to_value(&envelope).unwrap_or(Value::Null));
            ToolContent::Json {
                json,
            }
        }
        _ => ToolContent::Text {
            text: envelope.message,
        },
    }
}

/// Builds a successful JSON-RPC response.
fn result_response(id: Value, value: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: Some(value),
        error: None,
    }
}

/// Builds a JSON-RPC error response.
fn error_response(id: Value, code: i64, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    }
}

/// Builds the audit event for one handled request.
fn audit_event(
    transport: ServerTransport,
    response: &JsonRpcResponse,
    meta: &RequestMeta,
    request_bytes: usize,
    response_bytes: usize,
) -> OpsAuditEvent {
    let error_code = response.error_code();
    OpsAuditEvent::new(OpsAuditEventParams {
        request_id: meta.request_id.clone(),
        transport,
        method: meta.method,
        tool: meta.tool.clone(),
        outcome: if error_code.is_none() {
            RequestOutcome::Ok
        } else {
            RequestOutcome::Error
        },
        error_code,
        request_bytes,
        response_bytes,
    })
}

// ============================================================================
// SECTION: Framing Helpers
// ============================================================================

/// Reads a framed stdio payload using MCP Content-Length headers.
///
/// Returns `Ok(None)` when the peer closed the channel cleanly before a new
/// frame started.
fn read_framed(
    reader: &mut BufReader<impl Read>,
    max_body_bytes: usize,
) -> Result<Option<Vec<u8>>, McpServerError> {
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            if content_length.is_none() {
                return Ok(None);
            }
            return Err(McpServerError::Transport("stdio closed mid-frame".to_string()));
        }
        if line.trim().is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            let parsed = value
                .trim()
                .parse::<usize>()
                .map_err(|_| McpServerError::Transport("invalid content length".to_string()))?;
            content_length = Some(parsed);
        }
    }
    let len = content_length
        .ok_or_else(|| McpServerError::Transport("missing content length".to_string()))?;
    if len > max_body_bytes {
        return Err(McpServerError::Transport("payload too large".to_string()));
    }
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
    Ok(Some(buf))
}

/// Writes a framed stdio payload using MCP Content-Length headers.
fn write_framed(writer: &mut impl Write, payload: &[u8]) -> Result<(), McpServerError> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer
        .write_all(header.as_bytes())
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer
        .write_all(payload)
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer.flush().map_err(|_| McpServerError::Transport("stdio write failed".to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
