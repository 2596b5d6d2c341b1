// crates/azure-ops-core/src/normalize.rs
// ============================================================================
// Module: Result Normalizer
// Description: Converts step records and remote responses into envelopes.
// Purpose: Give every operation outcome one uniform, diagnosable shape.
// Dependencies: azure-ops-core::classify, azure-ops-core::envelope, serde_json
// ============================================================================

//! ## Overview
//! The normalizer is the single place where heterogeneous outcomes (remote
//! failures, guest script output, parsed JSON documents) become a
//! [`ResultEnvelope`]. Remote errors keep the provider's message verbatim,
//! prefixed with the tool name and target resource so operators can locate
//! the failure. Guest output that cannot be confirmed is reported as partial,
//! and unparseable guest JSON becomes a failure that carries the raw text
//! instead of an exception.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::catalog::ToolName;
use crate::classify::GuestVerdict;
use crate::classify::classify;
use crate::client::GuestOutput;
use crate::envelope::ResultEnvelope;
use crate::orchestrate::DeploySummary;
use crate::orchestrate::DeployVmRequest;
use crate::orchestrate::ProcessUtilizationRequest;
use crate::orchestrate::RestartServiceRequest;
use crate::orchestrate::RestartVmRequest;
use crate::orchestrate::StepFailure;
use crate::orchestrate::StepResult;

// ============================================================================
// SECTION: Remote Failures
// ============================================================================

/// Builds the failure envelope for an aborted pipeline.
///
/// The provider's error text is embedded verbatim; the tool name and target
/// resource are prefixed for locatability.
#[must_use]
pub fn remote_failure(
    tool: ToolName,
    target: &str,
    steps: &[StepResult],
    failure: &StepFailure,
) -> ResultEnvelope {
    let message = format!(
        "❌ {tool} failed for '{target}': step '{step}': {error}",
        tool = tool.as_str(),
        step = failure.step,
        error = failure.error,
    );
    ResultEnvelope::failure(
        message,
        json!({
            "tool": tool.as_str(),
            "target": target,
            "step": failure.step,
            "error": failure.error.to_string(),
            "steps": steps,
        }),
    )
}

// ============================================================================
// SECTION: Deploy
// ============================================================================

/// Normalizes a `deploy_vm` outcome.
#[must_use]
pub fn deploy(
    request: &DeployVmRequest,
    steps: &[StepResult],
    result: &Result<DeploySummary, StepFailure>,
) -> ResultEnvelope {
    match result {
        Ok(summary) => {
            let address = summary.public_ip.as_deref().unwrap_or("(allocation pending)");
            let connection = match summary.os_type {
                crate::client::OsType::Linux => {
                    format!("  ssh {}@{}", summary.admin_username, address)
                }
                crate::client::OsType::Windows => format!("  RDP to {address}"),
            };
            let message = format!(
                "✅ Virtual machine deployed successfully!\n\nVM Details:\n- Name: {name}\n- \
                 Resource Group: {group}\n- Location: {location}\n- Size: {size}\n- OS: \
                 {os}\n- Public IP: {address}\n- Admin Username: {user}\n\nResources \
                 Created:\n- Virtual Machine: {name}\n- Network Interface: {nic}\n- Public IP: \
                 {ip_name}\n- Virtual Network: {vnet}\n- Subnet: {subnet}\n\nConnection \
                 Info:\n{connection}",
                name = summary.vm_name,
                group = summary.resource_group,
                location = summary.location,
                size = summary.vm_size,
                os = summary.os_type.as_str(),
                user = summary.admin_username,
                nic = summary.network_interface,
                ip_name = summary.public_ip_name,
                vnet = summary.virtual_network,
                subnet = summary.subnet,
            );
            ResultEnvelope::success(
                message,
                Some(json!({
                    "summary": summary,
                    "steps": steps,
                })),
            )
        }
        Err(failure) => remote_failure(ToolName::DeployVm, &request.vm_name, steps, failure),
    }
}

// ============================================================================
// SECTION: Restart VM
// ============================================================================

/// Normalizes a `restart_vm` outcome.
#[must_use]
pub fn restart_vm(
    request: &RestartVmRequest,
    steps: &[StepResult],
    result: &Result<(), StepFailure>,
) -> ResultEnvelope {
    match result {
        Ok(()) => ResultEnvelope::success(
            format!(
                "✅ Successfully restarted VM '{}' in resource group '{}'",
                request.vm_name, request.resource_group
            ),
            Some(json!({
                "steps": steps,
            })),
        ),
        Err(failure) => remote_failure(ToolName::RestartVm, &request.vm_name, steps, failure),
    }
}

// ============================================================================
// SECTION: Restart Service
// ============================================================================

/// Normalizes a `restart_service` outcome by classifying the guest output.
#[must_use]
pub fn restart_service(
    request: &RestartServiceRequest,
    steps: &[StepResult],
    result: &Result<GuestOutput, StepFailure>,
) -> ResultEnvelope {
    let target = format!("'{}' on VM '{}'", request.service_name, request.vm_name);
    match result {
        Ok(output) => match classify(output) {
            GuestVerdict::Success => ResultEnvelope::success(
                format!("✅ Service restart completed for {target}:\n\n{}", output.stdout),
                Some(json!({
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                    "steps": steps,
                })),
            ),
            GuestVerdict::Failure => ResultEnvelope::failure(
                format!(
                    "❌ Service restart failed for {target}:\n\n{}\n{}",
                    output.stdout, output.stderr
                ),
                json!({
                    "error": "guest script reported failure",
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                    "steps": steps,
                }),
            ),
            GuestVerdict::Ambiguous => ResultEnvelope::partial(
                format!("⚠️ Service restart status for {target}:\n\n{}", output.stdout),
                Some(json!({
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                    "steps": steps,
                })),
            ),
        },
        Err(failure) => {
            remote_failure(ToolName::RestartService, &request.vm_name, steps, failure)
        }
    }
}

// ============================================================================
// SECTION: Process Utilization
// ============================================================================

/// Normalizes a `get_process_utilization` outcome by parsing guest JSON.
///
/// Output captured from a guest is untrusted and is never assumed to be
/// well-formed; parse failures become failure envelopes that carry the raw
/// text for diagnosis.
#[must_use]
pub fn process_utilization(
    request: &ProcessUtilizationRequest,
    steps: &[StepResult],
    result: &Result<GuestOutput, StepFailure>,
) -> ResultEnvelope {
    match result {
        Ok(output) => {
            if output.stdout.trim().is_empty() {
                return ResultEnvelope::failure(
                    format!("❌ No output received from VM '{}'", request.vm_name),
                    json!({
                        "error": "no output received from the guest",
                        "raw_output": output.stdout,
                        "stderr": output.stderr,
                        "steps": steps,
                    }),
                );
            }
            match serde_json::from_str::<Value>(output.stdout.trim()) {
                Ok(document) => {
                    if document.get("success").and_then(Value::as_bool) == Some(false) {
                        return ResultEnvelope::failure(
                            format!(
                                "❌ Process sampling reported failure on VM '{}'",
                                request.vm_name
                            ),
                            document,
                        );
                    }
                    ResultEnvelope::success(
                        format!(
                            "Sampled {}s of process utilization on VM '{}'",
                            request.sample_seconds, request.vm_name
                        ),
                        Some(document),
                    )
                }
                Err(_) => ResultEnvelope::failure(
                    format!(
                        "❌ Failed to parse guest output from VM '{}' as JSON",
                        request.vm_name
                    ),
                    json!({
                        "error": "failed to parse guest output as JSON",
                        "raw_output": output.stdout,
                        "stderr": output.stderr,
                        "steps": steps,
                    }),
                ),
            }
        }
        Err(failure) => {
            remote_failure(ToolName::GetProcessUtilization, &request.vm_name, steps, failure)
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
