// crates/azure-ops-arm/src/credentials.rs
// ============================================================================
// Module: Client Secret Credentials
// Description: Process-wide Azure credentials loaded once at startup.
// Purpose: Collect tenant, client identity, secret, and subscription from env.
// Dependencies: std, thiserror
// ============================================================================

//! ## Overview
//! Credentials are read from the environment exactly once at startup and are
//! read-only afterwards; every concurrent call shares the same instance
//! without coordination. Missing variables are collected and reported
//! together so operators fix the whole set in one pass instead of one
//! variable per restart.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Environment Names
// ============================================================================

/// Environment variable holding the Entra tenant identifier.
pub const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
/// Environment variable holding the service principal client identifier.
pub const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
/// Environment variable holding the service principal client secret.
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
/// Environment variable holding the target subscription identifier.
pub const SUBSCRIPTION_ID_ENV: &str = "AZURE_SUBSCRIPTION_ID";

/// All required environment variables, in reporting order.
pub const REQUIRED_ENV_VARS: [&str; 4] =
    [TENANT_ID_ENV, CLIENT_ID_ENV, CLIENT_SECRET_ENV, SUBSCRIPTION_ID_ENV];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Client-secret credentials for the Azure control plane.
#[derive(Clone)]
pub struct Credentials {
    /// Entra tenant identifier.
    pub tenant_id: String,
    /// Service principal client identifier.
    pub client_id: String,
    /// Service principal client secret.
    pub client_secret: String,
    /// Target subscription identifier.
    pub subscription_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

/// Credential loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// One or more required environment variables are absent or empty.
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl Credentials {
    /// Loads credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::MissingEnv`] enumerating every absent or
    /// empty variable.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads credentials through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::MissingEnv`] enumerating every absent or
    /// empty variable.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CredentialsError> {
        let mut missing = Vec::new();
        let mut read = |name: &'static str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };
        let tenant_id = read(TENANT_ID_ENV);
        let client_id = read(CLIENT_ID_ENV);
        let client_secret = read(CLIENT_SECRET_ENV);
        let subscription_id = read(SUBSCRIPTION_ID_ENV);
        if !missing.is_empty() {
            return Err(CredentialsError::MissingEnv(missing));
        }
        Ok(Self {
            tenant_id,
            client_id,
            client_secret,
            subscription_id,
        })
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
        clippy::use_debug,
        reason = "Test-only assertions favor direct unwrap/expect for clarity."
    )]

    use super::*;

    #[test]
    fn all_missing_variables_are_enumerated_together() {
        let error = Credentials::from_lookup(|_| None).expect_err("nothing set");
        let CredentialsError::MissingEnv(missing) = error;
        assert_eq!(missing, REQUIRED_ENV_VARS.to_vec());
    }

    #[test]
    fn empty_values_count_as_missing() {
        let error = Credentials::from_lookup(|name| {
            if name == CLIENT_SECRET_ENV {
                Some("   ".to_string())
            } else {
                Some("value".to_string())
            }
        })
        .expect_err("blank secret");
        let CredentialsError::MissingEnv(missing) = error;
        assert_eq!(missing, vec![CLIENT_SECRET_ENV]);
    }

    #[test]
    fn complete_environments_load() {
        let credentials = Credentials::from_lookup(|name| Some(format!("{name}-value")))
            .expect("complete environment");
        assert_eq!(credentials.tenant_id, "AZURE_TENANT_ID-value");
        assert_eq!(credentials.subscription_id, "AZURE_SUBSCRIPTION_ID-value");
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let credentials = Credentials::from_lookup(|name| Some(format!("{name}-value")))
            .expect("complete environment");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("AZURE_CLIENT_SECRET-value"));
    }
}
