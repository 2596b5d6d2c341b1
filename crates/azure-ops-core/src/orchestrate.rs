// crates/azure-ops-core/src/orchestrate.rs
// ============================================================================
// Module: Operation Orchestrator
// Description: Fixed step pipelines over the remote resource interface.
// Purpose: Execute dependent remote steps sequentially with fail-fast abort.
// Dependencies: azure-ops-core::client, azure-ops-core::scripts, serde
// ============================================================================

//! ## Overview
//! Each tool is a fixed chain of remote steps. Later steps take identifiers
//! produced by earlier steps, so execution is strictly sequential: there is
//! no scheduler, only an aggregator that records every step and stops at the
//! first failure. Nothing is rolled back on abort; partially-created
//! infrastructure is left in place for the caller to inspect, and the step
//! record says exactly how far the pipeline got.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::client::GuestOutput;
use crate::client::OsType;
use crate::client::RemoteError;
use crate::client::ResourceOps;
use crate::client::VmDeployment;
use crate::scripts;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Address space assigned to created virtual networks.
pub const VNET_ADDRESS_SPACE: &str = "10.0.0.0/16";
/// Address prefix assigned to created subnets.
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.0.0/24";

/// Step name: resource group create-or-update.
pub const STEP_RESOURCE_GROUP: &str = "resource_group";
/// Step name: virtual network creation.
pub const STEP_VIRTUAL_NETWORK: &str = "virtual_network";
/// Step name: subnet creation.
pub const STEP_SUBNET: &str = "subnet";
/// Step name: public IP allocation.
pub const STEP_PUBLIC_IP: &str = "public_ip";
/// Step name: network interface creation.
pub const STEP_NETWORK_INTERFACE: &str = "network_interface";
/// Step name: virtual machine creation.
pub const STEP_VIRTUAL_MACHINE: &str = "virtual_machine";
/// Step name: read-back of the allocated public address.
pub const STEP_PUBLIC_IP_READ: &str = "public_ip_read";
/// Step name: virtual machine existence check.
pub const STEP_VM_GET: &str = "virtual_machine_get";
/// Step name: virtual machine restart.
pub const STEP_VM_RESTART: &str = "restart";
/// Step name: guest script execution through run-command.
pub const STEP_RUN_COMMAND: &str = "run_command";

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Validated request for `deploy_vm`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployVmRequest {
    /// Resource group name; created when it does not exist.
    pub resource_group: String,
    /// Name for the virtual machine.
    pub vm_name: String,
    /// Administrator password.
    pub admin_password: String,
    /// Azure region.
    pub location: String,
    /// VM hardware size.
    pub vm_size: String,
    /// Administrator username.
    pub admin_username: String,
    /// Guest operating system family.
    pub os_type: OsType,
}

/// Validated request for `restart_vm`.
#[derive(Debug, Clone, Deserialize)]
pub struct RestartVmRequest {
    /// Resource group containing the virtual machine.
    pub resource_group: String,
    /// Name of the virtual machine to restart.
    pub vm_name: String,
}

/// Validated request for `restart_service`.
#[derive(Debug, Clone, Deserialize)]
pub struct RestartServiceRequest {
    /// Resource group containing the virtual machine.
    pub resource_group: String,
    /// Name of the virtual machine.
    pub vm_name: String,
    /// Name of the service to restart.
    pub service_name: String,
    /// Guest operating system family.
    pub os_type: OsType,
}

/// Validated request for `get_process_utilization`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessUtilizationRequest {
    /// Resource group containing the virtual machine.
    pub resource_group: String,
    /// Name of the virtual machine.
    pub vm_name: String,
    /// Guest operating system family.
    pub os_type: OsType,
    /// Sampling period between snapshots, in seconds.
    pub sample_seconds: i64,
    /// Number of top processes to return.
    pub top_n: i64,
}

// ============================================================================
// SECTION: Step Records
// ============================================================================

/// Record of a single executed pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Step name within the pipeline.
    pub step: &'static str,
    /// Remote identifier produced by the step, when one exists.
    pub remote_id: Option<String>,
    /// Whether the step completed.
    pub succeeded: bool,
}

/// First failure encountered by a pipeline.
#[derive(Debug)]
pub struct StepFailure {
    /// Step that failed.
    pub step: &'static str,
    /// Underlying remote error, preserved verbatim.
    pub error: RemoteError,
}

/// Runs one pipeline step, recording its outcome.
///
/// On failure the step is recorded as failed and the pipeline aborts; no
/// later step is ever issued.
fn run_step<T>(
    steps: &mut Vec<StepResult>,
    step: &'static str,
    outcome: Result<T, RemoteError>,
    remote_id: impl FnOnce(&T) -> Option<String>,
) -> Result<T, StepFailure> {
    match outcome {
        Ok(value) => {
            steps.push(StepResult {
                step,
                remote_id: remote_id(&value),
                succeeded: true,
            });
            Ok(value)
        }
        Err(error) => {
            steps.push(StepResult {
                step,
                remote_id: None,
                succeeded: false,
            });
            Err(StepFailure {
                step,
                error,
            })
        }
    }
}

// ============================================================================
// SECTION: Deploy Pipeline
// ============================================================================

/// Structured summary of a completed deployment.
#[derive(Debug, Clone, Serialize)]
pub struct DeploySummary {
    /// Virtual machine name.
    pub vm_name: String,
    /// Resource group hosting the deployment.
    pub resource_group: String,
    /// Region hosting the deployment.
    pub location: String,
    /// VM hardware size.
    pub vm_size: String,
    /// Guest operating system family.
    pub os_type: OsType,
    /// Administrator username.
    pub admin_username: String,
    /// Allocated public address, absent while allocation is pending.
    pub public_ip: Option<String>,
    /// Created virtual network name.
    pub virtual_network: String,
    /// Created subnet name.
    pub subnet: String,
    /// Created public IP resource name.
    pub public_ip_name: String,
    /// Created network interface name.
    pub network_interface: String,
}

/// Runs the `deploy_vm` pipeline.
#[must_use]
pub fn deploy_vm(
    ops: &dyn ResourceOps,
    request: &DeployVmRequest,
) -> (Vec<StepResult>, Result<DeploySummary, StepFailure>) {
    let mut steps = Vec::new();
    let result = run_deploy(ops, request, &mut steps);
    (steps, result)
}

/// Executes the deployment chain, threading identifiers between steps.
fn run_deploy(
    ops: &dyn ResourceOps,
    request: &DeployVmRequest,
    steps: &mut Vec<StepResult>,
) -> Result<DeploySummary, StepFailure> {
    let vnet_name = format!("{}-vnet", request.vm_name);
    let subnet_name = format!("{}-subnet", request.vm_name);
    let public_ip_name = format!("{}-ip", request.vm_name);
    let nic_name = format!("{}-nic", request.vm_name);

    run_step(
        steps,
        STEP_RESOURCE_GROUP,
        ops.ensure_resource_group(&request.resource_group, &request.location),
        |resource| Some(resource.id.clone()),
    )?;
    run_step(
        steps,
        STEP_VIRTUAL_NETWORK,
        ops.create_virtual_network(
            &request.resource_group,
            &vnet_name,
            &request.location,
            VNET_ADDRESS_SPACE,
        ),
        |resource| Some(resource.id.clone()),
    )?;
    let subnet = run_step(
        steps,
        STEP_SUBNET,
        ops.create_subnet(&request.resource_group, &vnet_name, &subnet_name, SUBNET_ADDRESS_PREFIX),
        |resource| Some(resource.id.clone()),
    )?;
    let public_ip = run_step(
        steps,
        STEP_PUBLIC_IP,
        ops.create_public_ip(&request.resource_group, &public_ip_name, &request.location),
        |resource| Some(resource.id.clone()),
    )?;
    let nic = run_step(
        steps,
        STEP_NETWORK_INTERFACE,
        ops.create_network_interface(
            &request.resource_group,
            &nic_name,
            &request.location,
            &subnet.id,
            &public_ip.id,
        ),
        |resource| Some(resource.id.clone()),
    )?;
    run_step(
        steps,
        STEP_VIRTUAL_MACHINE,
        ops.create_virtual_machine(
            &request.resource_group,
            &VmDeployment {
                name: request.vm_name.clone(),
                location: request.location.clone(),
                size: request.vm_size.clone(),
                os_type: request.os_type,
                admin_username: request.admin_username.clone(),
                admin_password: request.admin_password.clone(),
                network_interface_id: nic.id.clone(),
            },
        ),
        |resource| Some(resource.id.clone()),
    )?;
    let address = run_step(
        steps,
        STEP_PUBLIC_IP_READ,
        ops.get_public_ip(&request.resource_group, &public_ip_name),
        |address| Some(address.id.clone()),
    )?;

    Ok(DeploySummary {
        vm_name: request.vm_name.clone(),
        resource_group: request.resource_group.clone(),
        location: request.location.clone(),
        vm_size: request.vm_size.clone(),
        os_type: request.os_type,
        admin_username: request.admin_username.clone(),
        public_ip: address.ip_address,
        virtual_network: vnet_name,
        subnet: subnet_name,
        public_ip_name,
        network_interface: nic_name,
    })
}

// ============================================================================
// SECTION: Restart Pipeline
// ============================================================================

/// Runs the `restart_vm` pipeline.
///
/// The existence check is deliberate: a missing VM surfaces as a failure
/// instead of being treated as already restarted.
#[must_use]
pub fn restart_vm(
    ops: &dyn ResourceOps,
    request: &RestartVmRequest,
) -> (Vec<StepResult>, Result<(), StepFailure>) {
    let mut steps = Vec::new();
    let result = run_restart(ops, request, &mut steps);
    (steps, result)
}

/// Executes the restart chain.
fn run_restart(
    ops: &dyn ResourceOps,
    request: &RestartVmRequest,
    steps: &mut Vec<StepResult>,
) -> Result<(), StepFailure> {
    run_step(
        steps,
        STEP_VM_GET,
        ops.get_virtual_machine(&request.resource_group, &request.vm_name),
        |machine| Some(machine.id.clone()),
    )?;
    run_step(
        steps,
        STEP_VM_RESTART,
        ops.restart_virtual_machine(&request.resource_group, &request.vm_name),
        |_| None,
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Guest Script Pipelines
// ============================================================================

/// Runs the `restart_service` pipeline.
///
/// Ships the OS-specific restart script through run-command and returns the
/// captured guest output for classification. The returned output reflects
/// the inner script only; an outer run-command failure is reported through
/// [`StepFailure`].
#[must_use]
pub fn restart_service(
    ops: &dyn ResourceOps,
    request: &RestartServiceRequest,
) -> (Vec<StepResult>, Result<GuestOutput, StepFailure>) {
    let mut steps = Vec::new();
    let command =
        scripts::service_restart(request.os_type, &request.service_name, &request.vm_name);
    let result = run_step(
        &mut steps,
        STEP_RUN_COMMAND,
        ops.run_command(&request.resource_group, &request.vm_name, &command),
        |_| None,
    );
    (steps, result)
}

/// Runs the `get_process_utilization` pipeline.
#[must_use]
pub fn process_utilization(
    ops: &dyn ResourceOps,
    request: &ProcessUtilizationRequest,
) -> (Vec<StepResult>, Result<GuestOutput, StepFailure>) {
    let mut steps = Vec::new();
    let command = scripts::process_sample(
        request.os_type,
        &request.vm_name,
        request.sample_seconds,
        request.top_n,
    );
    let result = run_step(
        &mut steps,
        STEP_RUN_COMMAND,
        ops.run_command(&request.resource_group, &request.vm_name, &command),
        |_| None,
    );
    (steps, result)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
