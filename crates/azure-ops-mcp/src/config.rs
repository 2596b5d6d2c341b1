// crates/azure-ops-mcp/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: Typed configuration for the MCP server transports.
// Purpose: Validate transport, bind, and logging settings before serving.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Server settings are assembled by the CLI and validated fail-closed before
//! the server starts; a config that passes [`ServerConfig::validate`] cannot
//! produce a half-configured server. Host and port only matter for the HTTP
//! transport and are ignored under stdio.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default HTTP host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Default operational log file name.
pub const DEFAULT_AUDIT_LOG: &str = "azure-ops-mcp.log";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Transport carrying MCP requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Content-Length framed JSON-RPC over stdin/stdout.
    Stdio,
    /// JSON-RPC over HTTP with optional SSE streaming responses.
    Http,
}

/// MCP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Transport carrying requests.
    pub transport: ServerTransport,
    /// HTTP bind host; ignored under stdio.
    pub host: String,
    /// HTTP bind port; ignored under stdio.
    pub port: u16,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Operational log path; disabled when absent.
    pub audit_log: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            audit_log: Some(PathBuf::from(DEFAULT_AUDIT_LOG)),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The HTTP host is empty.
    #[error("http host must not be empty")]
    EmptyHost,
    /// The HTTP port is zero.
    #[error("http port must be non-zero")]
    ZeroPort,
    /// The body limit is too small to carry a tool call.
    #[error("max_body_bytes must be at least 1024")]
    BodyLimitTooSmall,
}

impl ServerConfig {
    /// Validates the configuration fail-closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes < 1024 {
            return Err(ConfigError::BodyLimitTooSmall);
        }
        if self.transport == ServerTransport::Http {
            if self.host.trim().is_empty() {
                return Err(ConfigError::EmptyHost);
            }
            if self.port == 0 {
                return Err(ConfigError::ZeroPort);
            }
        }
        Ok(())
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
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

    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn http_transport_rejects_empty_hosts() {
        let config = ServerConfig {
            transport: ServerTransport::Http,
            host: String::new(),
            ..ServerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyHost));
    }

    #[test]
    fn http_transport_rejects_zero_ports() {
        let config = ServerConfig {
            transport: ServerTransport::Http,
            port: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPort));
    }

    #[test]
    fn stdio_transport_ignores_bind_settings() {
        let config = ServerConfig {
            transport: ServerTransport::Stdio,
            host: String::new(),
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tiny_body_limits_are_rejected() {
        let config = ServerConfig {
            max_body_bytes: 16,
            ..ServerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BodyLimitTooSmall));
    }
}
