// crates/azure-ops-core/src/client.rs
// ============================================================================
// Module: Remote Resource Interface
// Description: Interface boundary for the cloud control plane.
// Purpose: Define the create/get/restart/run-command primitives pipelines use.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Pipelines talk to the Azure control plane exclusively through
//! [`ResourceOps`]. Every method blocks until the underlying long-running
//! operation completes; "begin" plus "await completion" is one suspension
//! point as far as the orchestrator is concerned. Implementations live
//! outside this crate (`azure-ops-arm` for the real control plane, scripted
//! stubs in tests), so pipeline semantics can be exercised without network
//! access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Operating Systems
// ============================================================================

/// Guest operating system families supported by the tool surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    /// Linux guests (Ubuntu 22.04 LTS image).
    Linux,
    /// Windows guests (Windows Server 2022 image).
    Windows,
}

impl OsType {
    /// Returns the wire representation of the OS family.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }
}

// ============================================================================
// SECTION: Remote Shapes
// ============================================================================

/// Identifier-bearing handle returned by create-or-update operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteResource {
    /// Fully-qualified resource identifier assigned by the control plane.
    pub id: String,
}

/// Read-only view of a public IP address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicIpAddress {
    /// Fully-qualified resource identifier.
    pub id: String,
    /// Allocated address, absent while allocation is still pending.
    pub ip_address: Option<String>,
}

/// Read-only view of an existing virtual machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMachineView {
    /// Fully-qualified resource identifier.
    pub id: String,
    /// Virtual machine name.
    pub name: String,
    /// Region hosting the machine.
    pub location: String,
}

/// Full description of a virtual machine to create.
#[derive(Debug, Clone)]
pub struct VmDeployment {
    /// Virtual machine name; also used as the guest computer name.
    pub name: String,
    /// Region for the machine and its disks.
    pub location: String,
    /// Hardware size, e.g. `Standard_B2s`.
    pub size: String,
    /// Guest operating system family selecting the OS image.
    pub os_type: OsType,
    /// Administrator username.
    pub admin_username: String,
    /// Administrator password.
    pub admin_password: String,
    /// Identifier of the network interface to attach as primary.
    pub network_interface_id: String,
}

/// Script shipped to a guest through the run-command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestCommand {
    /// Provider command identifier (`RunShellScript` or `RunPowerShellScript`).
    pub command_id: &'static str,
    /// Inline script body executed inside the guest.
    pub script: String,
}

/// Captured output of a guest script execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestOutput {
    /// Captured standard output of the inner script.
    pub stdout: String,
    /// Captured standard error of the inner script.
    pub stderr: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures surfaced by the remote control plane.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The referenced resource does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// The control plane rejected the request.
    #[error("azure api error (status {status}): {message}")]
    Api {
        /// HTTP status returned by the control plane.
        status: u16,
        /// Verbatim provider error text.
        message: String,
    },
    /// Credential acquisition or token refresh failed.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// The request never reached the control plane.
    #[error("transport failure: {0}")]
    Transport(String),
    /// A long-running operation failed or did not complete in time.
    #[error("operation did not complete: {0}")]
    Operation(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Blocking interface to the cloud control plane.
///
/// Each method awaits the completion of the operation it starts; the
/// implementation's internal polling is opaque to callers.
pub trait ResourceOps: Send + Sync {
    /// Creates or updates a resource group; safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the control plane rejects the request.
    fn ensure_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<RemoteResource, RemoteError>;

    /// Creates or updates a virtual network with the given address space.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the control plane rejects the request.
    fn create_virtual_network(
        &self,
        group: &str,
        name: &str,
        location: &str,
        address_space: &str,
    ) -> Result<RemoteResource, RemoteError>;

    /// Creates or updates a subnet within a virtual network.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the control plane rejects the request.
    fn create_subnet(
        &self,
        group: &str,
        virtual_network: &str,
        name: &str,
        address_prefix: &str,
    ) -> Result<RemoteResource, RemoteError>;

    /// Allocates a static Standard-SKU IPv4 public address.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the control plane rejects the request.
    fn create_public_ip(
        &self,
        group: &str,
        name: &str,
        location: &str,
    ) -> Result<RemoteResource, RemoteError>;

    /// Creates a network interface binding a subnet and a public address.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the control plane rejects the request.
    fn create_network_interface(
        &self,
        group: &str,
        name: &str,
        location: &str,
        subnet_id: &str,
        public_ip_id: &str,
    ) -> Result<RemoteResource, RemoteError>;

    /// Creates a virtual machine attached to an existing network interface.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the control plane rejects the request.
    fn create_virtual_machine(
        &self,
        group: &str,
        deployment: &VmDeployment,
    ) -> Result<RemoteResource, RemoteError>;

    /// Fetches an existing virtual machine.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] when the machine does not exist.
    fn get_virtual_machine(
        &self,
        group: &str,
        name: &str,
    ) -> Result<VirtualMachineView, RemoteError>;

    /// Fetches a public IP address, including its allocated address.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the address cannot be read.
    fn get_public_ip(&self, group: &str, name: &str) -> Result<PublicIpAddress, RemoteError>;

    /// Restarts a virtual machine and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the restart is rejected or fails.
    fn restart_virtual_machine(&self, group: &str, name: &str) -> Result<(), RemoteError>;

    /// Executes a script inside the guest and captures its output.
    ///
    /// The outer call can fail independently of the inner script; a
    /// successful return only means the script ran and its output was
    /// captured, not that the script achieved anything.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the run-command call itself fails.
    fn run_command(
        &self,
        group: &str,
        vm_name: &str,
        command: &GuestCommand,
    ) -> Result<GuestOutput, RemoteError>;
}
