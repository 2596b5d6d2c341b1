// crates/azure-ops-core/src/classify.rs
// ============================================================================
// Module: Guest Output Classification
// Description: Ordered marker policy for guest script output.
// Purpose: Map captured stdout/stderr to a success/failure/ambiguous verdict.
// Dependencies: azure-ops-core::client
// ============================================================================

//! ## Overview
//! Guest scripts report progress through marker strings on their own stdout;
//! there is no structured exit channel through the run-command API. The
//! classification below is an explicit, ordered rule list: an explicit
//! failure marker wins over everything, any captured stderr counts as
//! failure, then an explicit success marker, and anything else is ambiguous.
//! Ambiguous output is reported as partial and never upgraded to success.
//! The marker strings are conventions of our own script templates, not a
//! stable external protocol; version them together with the templates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::client::GuestOutput;

// ============================================================================
// SECTION: Markers
// ============================================================================

/// Marker emitted by guest scripts on success.
pub const SUCCESS_MARKER: &str = "✅";
/// Marker emitted by guest scripts on failure.
pub const FAILURE_MARKER: &str = "❌";

// ============================================================================
// SECTION: Verdicts
// ============================================================================

/// Classification of captured guest output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestVerdict {
    /// The script reported success.
    Success,
    /// The script reported failure or wrote to stderr.
    Failure,
    /// No clear marker; the effect of the script is unconfirmed.
    Ambiguous,
}

/// Classifies captured guest output with the ordered marker policy.
#[must_use]
pub fn classify(output: &GuestOutput) -> GuestVerdict {
    if output.stdout.contains(FAILURE_MARKER) {
        return GuestVerdict::Failure;
    }
    if !output.stderr.trim().is_empty() {
        return GuestVerdict::Failure;
    }
    if output.stdout.contains(SUCCESS_MARKER)
        || output.stdout.to_lowercase().contains("success")
    {
        return GuestVerdict::Success;
    }
    GuestVerdict::Ambiguous
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

    /// Builds guest output from stdout and stderr strings.
    fn output(stdout: &str, stderr: &str) -> GuestOutput {
        GuestOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn success_marker_with_clean_stderr_is_success() {
        assert_eq!(classify(&output("✅ Service restarted successfully!", "")), GuestVerdict::Success);
    }

    #[test]
    fn success_token_is_case_insensitive() {
        assert_eq!(classify(&output("restart completed: SUCCESS", "")), GuestVerdict::Success);
    }

    #[test]
    fn failure_marker_wins_over_success_marker() {
        let mixed = "✅ first attempt\n❌ Failed to restart service";
        assert_eq!(classify(&output(mixed, "")), GuestVerdict::Failure);
    }

    #[test]
    fn captured_stderr_outranks_success_markers() {
        assert_eq!(
            classify(&output("✅ done", "Job for nginx.service failed")),
            GuestVerdict::Failure
        );
    }

    #[test]
    fn whitespace_only_stderr_is_ignored() {
        assert_eq!(classify(&output("✅ done", "  \n")), GuestVerdict::Success);
    }

    #[test]
    fn output_without_markers_is_ambiguous() {
        assert_eq!(classify(&output("restarting...", "")), GuestVerdict::Ambiguous);
    }
}
