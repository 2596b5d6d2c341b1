// crates/azure-ops-core/src/lib.rs
// ============================================================================
// Module: Azure Ops Core
// Description: Tool-dispatch core for Azure VM operations.
// Purpose: Catalog, validation, orchestration, and normalization for tools.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Azure Ops Core is the transport-free heart of the server: a typed catalog
//! of VM operation tools, argument validation, fixed step pipelines over the
//! remote-resource interface, and the normalizer that turns every outcome
//! into one uniform result envelope. Transports and the real Azure client
//! live in sibling crates and only ever see [`Dispatcher`] and
//! [`ResultEnvelope`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod classify;
pub mod client;
pub mod dispatch;
pub mod envelope;
pub mod normalize;
pub mod orchestrate;
pub mod params;
pub mod scripts;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::ToolCatalog;
pub use catalog::ToolDefinition;
pub use catalog::ToolName;
pub use catalog::ToolSurface;
pub use classify::GuestVerdict;
pub use client::GuestCommand;
pub use client::GuestOutput;
pub use client::OsType;
pub use client::RemoteError;
pub use client::ResourceOps;
pub use dispatch::Dispatcher;
pub use envelope::Outcome;
pub use envelope::ResultEnvelope;
pub use params::ValidationError;
