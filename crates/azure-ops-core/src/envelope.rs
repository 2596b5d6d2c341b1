// crates/azure-ops-core/src/envelope.rs
// ============================================================================
// Module: Result Envelope
// Description: Uniform result shape returned for every tool call.
// Purpose: Carry outcome, operator message, and structured data to transports.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every tool call terminates in exactly one envelope, regardless of whether
//! the operation succeeded, failed remotely, or produced ambiguous guest
//! output. Failure envelopes always carry a structured error description so
//! operators can diagnose without scraping the human message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Terminal outcome of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every required step succeeded.
    Success,
    /// The operation completed but its effect could not be confirmed.
    Partial,
    /// A step failed or the call was rejected before any remote work.
    Failure,
}

/// Uniform result envelope returned to the transport.
///
/// # Invariants
/// - `outcome` is [`Outcome::Failure`] only when `data` carries an error
///   description; enforced by the constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Terminal outcome of the call.
    pub outcome: Outcome,
    /// Human-readable message for operators.
    pub message: String,
    /// Structured payload for programmatic consumers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResultEnvelope {
    /// Builds a success envelope.
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            outcome: Outcome::Success,
            message: message.into(),
            data,
        }
    }

    /// Builds a partial envelope for unconfirmed operations.
    #[must_use]
    pub fn partial(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            outcome: Outcome::Partial,
            message: message.into(),
            data,
        }
    }

    /// Builds a failure envelope carrying a structured error description.
    #[must_use]
    pub fn failure(message: impl Into<String>, error: Value) -> Self {
        Self {
            outcome: Outcome::Failure,
            message: message.into(),
            data: Some(error),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
