// crates/azure-ops-arm/src/lib.rs
// ============================================================================
// Module: Azure Ops ARM
// Description: Azure Resource Manager client for the tool pipelines.
// Purpose: Provide the real remote-resource implementation over REST.
// Dependencies: azure-ops-core, reqwest, serde, thiserror
// ============================================================================

//! ## Overview
//! Azure Ops ARM implements the core crate's remote-resource interface
//! against the Azure management plane: client-secret credentials from the
//! environment, OAuth2 token acquisition with caching, and blocking
//! create/get/restart/run-command primitives that poll long-running
//! operations to completion before returning.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod credentials;
pub mod token;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ArmClient;
pub use client::ArmClientError;
pub use credentials::Credentials;
pub use credentials::CredentialsError;
pub use credentials::REQUIRED_ENV_VARS;
pub use token::TokenError;
pub use token::TokenProvider;
