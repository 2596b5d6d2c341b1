// crates/azure-ops-arm/src/token.rs
// ============================================================================
// Module: Token Acquisition
// Description: OAuth2 client-credentials flow against the Entra endpoint.
// Purpose: Acquire and cache management-plane bearer tokens.
// Dependencies: reqwest, serde, thiserror
// ============================================================================

//! ## Overview
//! Tokens are acquired with the client-credentials grant and cached until
//! shortly before expiry; concurrent calls share one cached token behind a
//! mutex and only the refresher hits the network. The secret never appears
//! in errors or logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::Credentials;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Entra authority issuing management-plane tokens.
const AUTHORITY: &str = "https://login.microsoftonline.com";
/// OAuth2 scope for the Azure management plane.
const SCOPE: &str = "https://management.azure.com/.default";
/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Errors from token acquisition.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// The token request never completed.
    #[error("token request failed: {0}")]
    Http(String),
    /// The authority rejected the request.
    #[error("token request rejected (status {status}): {message}")]
    Rejected {
        /// HTTP status returned by the authority.
        status: u16,
        /// Error description returned by the authority.
        message: String,
    },
    /// The token response could not be decoded.
    #[error("token response invalid: {0}")]
    Decode(String),
}

/// Successful token response payload.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Bearer token value.
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: u64,
}

/// Error response payload from the authority.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    /// Error description text.
    error_description: Option<String>,
    /// Error code label.
    error: Option<String>,
}

/// Cached token with its refresh deadline.
struct CachedToken {
    /// Bearer token value.
    access_token: String,
    /// Instant after which the token must be refreshed.
    refresh_after: Instant,
}

/// Acquires and caches management-plane bearer tokens.
pub struct TokenProvider {
    /// HTTP client shared with the ARM client.
    http: Client,
    /// Credentials used for the client-credentials grant.
    credentials: Credentials,
    /// Cached token, refreshed shortly before expiry.
    cache: Mutex<Option<CachedToken>>,
}

// ============================================================================
// SECTION: Acquisition
// ============================================================================

impl TokenProvider {
    /// Builds a token provider over an existing HTTP client.
    #[must_use]
    pub fn new(http: Client, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            cache: Mutex::new(None),
        }
    }

    /// Returns a bearer token, refreshing the cache when needed.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when acquisition fails.
    pub fn bearer(&self) -> Result<String, TokenError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| TokenError::Http("token cache lock poisoned".to_string()))?;
        if let Some(cached) = cache.as_ref()
            && Instant::now() < cached.refresh_after
        {
            return Ok(cached.access_token.clone());
        }
        let fresh = self.fetch()?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    /// Fetches a new token with the client-credentials grant.
    fn fetch(&self) -> Result<CachedToken, TokenError> {
        let url = format!("{AUTHORITY}/{}/oauth2/v2.0/token", self.credentials.tenant_id);
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", SCOPE),
        ];
        let response = self.http.post(&url).form(&form).send().map_err(|err| {
            if err.is_timeout() {
                TokenError::Http("token request timed out".to_string())
            } else {
                TokenError::Http("token request failed".to_string())
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<TokenErrorResponse>()
                .ok()
                .and_then(|body| body.error_description.or(body.error))
                .unwrap_or_else(|| "no error description".to_string());
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        let body: TokenResponse =
            response.json().map_err(|err| TokenError::Decode(err.to_string()))?;
        let lifetime = Duration::from_secs(body.expires_in);
        let refresh_after =
            Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            access_token: body.access_token,
            refresh_after,
        })
    }
}
