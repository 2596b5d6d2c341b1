// crates/azure-ops-core/src/dispatch.rs
// ============================================================================
// Module: Dispatcher
// Description: Transport-agnostic routing of tool calls to pipelines.
// Purpose: Run Validator -> Orchestrator -> Normalizer for every call.
// Dependencies: azure-ops-core::catalog, azure-ops-core::orchestrate
// ============================================================================

//! ## Overview
//! The dispatcher receives a (tool name, arguments) pair from whichever
//! transport is active and always terminates in a [`ResultEnvelope`]:
//! unknown tools, invalid arguments, remote failures, and ambiguous guest
//! output all become envelopes rather than faults. No remote call is issued
//! until validation has passed. Behavior is identical across transports; the
//! dispatcher has no idea which one invoked it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::catalog::ToolCatalog;
use crate::catalog::ToolName;
use crate::client::ResourceOps;
use crate::envelope::ResultEnvelope;
use crate::normalize;
use crate::orchestrate;
use crate::orchestrate::DeployVmRequest;
use crate::orchestrate::ProcessUtilizationRequest;
use crate::orchestrate::RestartServiceRequest;
use crate::orchestrate::RestartVmRequest;
use crate::params::ValidationError;
use crate::params::validate;
use crate::scripts::is_safe_token;

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Routes tool calls through validation, orchestration, and normalization.
pub struct Dispatcher {
    /// Static tool registry.
    catalog: ToolCatalog,
    /// Shared handle to the remote control plane.
    ops: Arc<dyn ResourceOps>,
}

impl Dispatcher {
    /// Builds a dispatcher over a catalog and a remote client handle.
    #[must_use]
    pub fn new(catalog: ToolCatalog, ops: Arc<dyn ResourceOps>) -> Self {
        Self {
            catalog,
            ops,
        }
    }

    /// Returns the tool catalog backing this dispatcher.
    #[must_use]
    pub const fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Dispatches a tool call; every path terminates in an envelope.
    #[must_use]
    pub fn dispatch(&self, name: &str, arguments: &Value) -> ResultEnvelope {
        let Some(map) = argument_map(arguments) else {
            return ResultEnvelope::failure(
                format!("❌ Arguments for '{name}' must be a JSON object"),
                json!({
                    "error": "arguments must be a JSON object",
                    "tool": name,
                }),
            );
        };
        let Some(spec) = self.catalog.lookup(name) else {
            return ResultEnvelope::failure(
                format!("❌ Unknown tool: '{name}'"),
                json!({
                    "error": "unknown tool",
                    "tool": name,
                }),
            );
        };
        let validated = match validate(spec, &map) {
            Ok(validated) => validated,
            Err(error) => return validation_failure(spec.name, &error),
        };
        match spec.name {
            ToolName::DeployVm => match validated.decode::<DeployVmRequest>() {
                Ok(request) => {
                    let (steps, result) = orchestrate::deploy_vm(self.ops.as_ref(), &request);
                    normalize::deploy(&request, &steps, &result)
                }
                Err(error) => validation_failure(spec.name, &error),
            },
            ToolName::RestartVm => match validated.decode::<RestartVmRequest>() {
                Ok(request) => {
                    let (steps, result) = orchestrate::restart_vm(self.ops.as_ref(), &request);
                    normalize::restart_vm(&request, &steps, &result)
                }
                Err(error) => validation_failure(spec.name, &error),
            },
            ToolName::RestartService => match validated.decode::<RestartServiceRequest>() {
                Ok(request) => {
                    if let Some(envelope) = guest_token_guard(
                        spec.name,
                        &[
                            ("vm_name", request.vm_name.as_str()),
                            ("service_name", request.service_name.as_str()),
                        ],
                    ) {
                        return envelope;
                    }
                    let (steps, result) =
                        orchestrate::restart_service(self.ops.as_ref(), &request);
                    normalize::restart_service(&request, &steps, &result)
                }
                Err(error) => validation_failure(spec.name, &error),
            },
            ToolName::GetProcessUtilization => {
                match validated.decode::<ProcessUtilizationRequest>() {
                    Ok(request) => {
                        if let Some(envelope) = guest_token_guard(
                            spec.name,
                            &[("vm_name", request.vm_name.as_str())],
                        ) {
                            return envelope;
                        }
                        let (steps, result) =
                            orchestrate::process_utilization(self.ops.as_ref(), &request);
                        normalize::process_utilization(&request, &steps, &result)
                    }
                    Err(error) => validation_failure(spec.name, &error),
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the argument object, treating null as an empty map.
fn argument_map(arguments: &Value) -> Option<Map<String, Value>> {
    match arguments {
        Value::Object(map) => Some(map.clone()),
        Value::Null => Some(Map::new()),
        _ => None,
    }
}

/// Builds the failure envelope for a rejected call.
fn validation_failure(tool: ToolName, error: &ValidationError) -> ResultEnvelope {
    ResultEnvelope::failure(
        format!("❌ Invalid arguments for '{}': {error}", tool.as_str()),
        json!({
            "error": error.to_string(),
            "tool": tool.as_str(),
        }),
    )
}

/// Rejects values that cannot be safely interpolated into a guest script.
fn guest_token_guard(tool: ToolName, values: &[(&str, &str)]) -> Option<ResultEnvelope> {
    for (parameter, value) in values {
        if !is_safe_token(value) {
            return Some(ResultEnvelope::failure(
                format!(
                    "❌ Invalid arguments for '{}': parameter {parameter} contains characters \
                     that cannot be shipped to a guest",
                    tool.as_str()
                ),
                json!({
                    "error": "value cannot be shipped to a guest script",
                    "parameter": parameter,
                    "tool": tool.as_str(),
                }),
            ));
        }
    }
    None
}
