// crates/azure-ops-core/src/normalize/tests.rs
// ============================================================================
// Module: Result Normalizer Unit Tests
// Description: Envelope construction tests for every outcome class.
// Purpose: Validate marker classification and untrusted-JSON handling.
// Dependencies: azure-ops-core
// ============================================================================

//! ## Overview
//! Exercises the normalizer directly: verbatim remote errors, guest marker
//! classification into success/failure/partial, and the parse-or-carry-raw
//! contract for guest JSON documents.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;

use super::*;
use crate::client::OsType;
use crate::client::RemoteError;
use crate::envelope::Outcome;
use crate::orchestrate::STEP_RUN_COMMAND;
use crate::orchestrate::STEP_SUBNET;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns a service restart request fixture.
fn service_request() -> RestartServiceRequest {
    RestartServiceRequest {
        resource_group: "ops-rg".to_string(),
        vm_name: "web-01".to_string(),
        service_name: "nginx".to_string(),
        os_type: OsType::Linux,
    }
}

/// Returns a process utilization request fixture.
fn process_request() -> ProcessUtilizationRequest {
    ProcessUtilizationRequest {
        resource_group: "ops-rg".to_string(),
        vm_name: "web-01".to_string(),
        os_type: OsType::Windows,
        sample_seconds: 5,
        top_n: 15,
    }
}

/// Wraps captured output in the pipeline result shape.
fn captured(stdout: &str, stderr: &str) -> Result<GuestOutput, StepFailure> {
    Ok(GuestOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

// ============================================================================
// SECTION: Remote Failure Tests
// ============================================================================

#[test]
fn remote_failures_carry_the_provider_message_verbatim() {
    let failure = StepFailure {
        step: STEP_SUBNET,
        error: RemoteError::Api {
            status: 409,
            message: "SubnetIsFull: address space exhausted".to_string(),
        },
    };
    let envelope = remote_failure(ToolName::DeployVm, "web-01", &[], &failure);
    assert_eq!(envelope.outcome, Outcome::Failure);
    assert!(envelope.message.contains("deploy_vm"));
    assert!(envelope.message.contains("web-01"));
    assert!(envelope.message.contains("SubnetIsFull: address space exhausted"));
    let data = envelope.data.expect("failure data");
    assert_eq!(data["step"], json!("subnet"));
}

// ============================================================================
// SECTION: Service Restart Tests
// ============================================================================

#[test]
fn success_marker_without_stderr_is_success() {
    let envelope = restart_service(
        &service_request(),
        &[],
        &captured("✅ Service restarted successfully!", ""),
    );
    assert_eq!(envelope.outcome, Outcome::Success);
}

#[test]
fn failure_marker_is_failure() {
    let envelope = restart_service(
        &service_request(),
        &[],
        &captured("❌ Service 'nginx' not found on this VM", ""),
    );
    assert_eq!(envelope.outcome, Outcome::Failure);
    let data = envelope.data.expect("failure data");
    assert!(data["stdout"].as_str().expect("stdout").contains("not found"));
}

#[test]
fn markerless_output_is_partial_never_success() {
    let envelope = restart_service(&service_request(), &[], &captured("Restarting...", ""));
    assert_eq!(envelope.outcome, Outcome::Partial);
    let data = envelope.data.expect("partial data");
    assert_eq!(data["stdout"], json!("Restarting..."));
}

#[test]
fn outer_run_command_failure_is_reported_with_step_identity() {
    let envelope = restart_service(
        &service_request(),
        &[],
        &Err(StepFailure {
            step: STEP_RUN_COMMAND,
            error: RemoteError::Transport("connection reset".to_string()),
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Failure);
    let data = envelope.data.expect("failure data");
    assert_eq!(data["step"], json!("run_command"));
}

// ============================================================================
// SECTION: Process Utilization Tests
// ============================================================================

#[test]
fn valid_guest_json_round_trips_into_the_envelope() {
    let stdout = r#"{"success":true,"processes":[{"process_name":"x","cpu_percent":12.5}]}"#;
    let envelope = process_utilization(&process_request(), &[], &captured(stdout, ""));
    assert_eq!(envelope.outcome, Outcome::Success);
    let data = envelope.data.expect("document");
    assert_eq!(data["processes"][0]["process_name"], json!("x"));
    assert_eq!(data["processes"][0]["cpu_percent"], json!(12.5));
}

#[test]
fn non_json_guest_output_fails_and_carries_the_raw_text() {
    let envelope = process_utilization(&process_request(), &[], &captured("garbage", ""));
    assert_eq!(envelope.outcome, Outcome::Failure);
    let data = envelope.data.expect("failure data");
    assert_eq!(data["raw_output"], json!("garbage"));
}

#[test]
fn empty_guest_output_is_a_failure_not_a_panic() {
    let envelope = process_utilization(&process_request(), &[], &captured("", "timeout"));
    assert_eq!(envelope.outcome, Outcome::Failure);
    let data = envelope.data.expect("failure data");
    assert_eq!(data["stderr"], json!("timeout"));
}

#[test]
fn guest_reported_failure_document_is_a_failure_envelope() {
    let stdout = r#"{"success":false,"error":"sampler crashed"}"#;
    let envelope = process_utilization(&process_request(), &[], &captured(stdout, ""));
    assert_eq!(envelope.outcome, Outcome::Failure);
    let data = envelope.data.expect("document");
    assert_eq!(data["error"], json!("sampler crashed"));
}
