// crates/azure-ops-core/tests/dispatch.rs
// ============================================================================
// Module: Dispatcher Integration Tests
// Description: End-to-end dispatch over a scripted remote-resource stub.
// Purpose: Validate that every path terminates in a well-formed envelope.
// Dependencies: azure-ops-core
// ============================================================================

//! ## Overview
//! Drives the dispatcher the way a transport would: raw tool names and JSON
//! argument payloads in, envelopes out. Covers unknown tools, validation
//! rejection before any remote call, and the full pipeline paths.

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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use azure_ops_core::Dispatcher;
use azure_ops_core::GuestCommand;
use azure_ops_core::GuestOutput;
use azure_ops_core::Outcome;
use azure_ops_core::RemoteError;
use azure_ops_core::ResourceOps;
use azure_ops_core::ToolCatalog;
use azure_ops_core::client::PublicIpAddress;
use azure_ops_core::client::RemoteResource;
use azure_ops_core::client::VirtualMachineView;
use azure_ops_core::client::VmDeployment;
use serde_json::json;

// ============================================================================
// SECTION: Stub Control Plane
// ============================================================================

/// Stub control plane that counts remote calls and scripts guest output.
#[derive(Default)]
struct StubOps {
    /// Total remote calls issued.
    call_count: AtomicUsize,
    /// Guest output returned by run-command.
    guest_stdout: String,
    /// Guest stderr returned by run-command.
    guest_stderr: String,
    /// Last guest command observed.
    last_command: Mutex<Option<GuestCommand>>,
}

impl StubOps {
    /// Returns the number of remote calls issued so far.
    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Counts one remote call.
    fn tick(&self) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl ResourceOps for StubOps {
    fn ensure_resource_group(
        &self,
        name: &str,
        _location: &str,
    ) -> Result<RemoteResource, RemoteError> {
        self.tick();
        Ok(RemoteResource {
            id: format!("/groups/{name}"),
        })
    }

    fn create_virtual_network(
        &self,
        _group: &str,
        name: &str,
        _location: &str,
        _address_space: &str,
    ) -> Result<RemoteResource, RemoteError> {
        self.tick();
        Ok(RemoteResource {
            id: format!("/vnets/{name}"),
        })
    }

    fn create_subnet(
        &self,
        _group: &str,
        _virtual_network: &str,
        name: &str,
        _address_prefix: &str,
    ) -> Result<RemoteResource, RemoteError> {
        self.tick();
        Ok(RemoteResource {
            id: format!("/subnets/{name}"),
        })
    }

    fn create_public_ip(
        &self,
        _group: &str,
        name: &str,
        _location: &str,
    ) -> Result<RemoteResource, RemoteError> {
        self.tick();
        Ok(RemoteResource {
            id: format!("/ips/{name}"),
        })
    }

    fn create_network_interface(
        &self,
        _group: &str,
        name: &str,
        _location: &str,
        _subnet_id: &str,
        _public_ip_id: &str,
    ) -> Result<RemoteResource, RemoteError> {
        self.tick();
        Ok(RemoteResource {
            id: format!("/nics/{name}"),
        })
    }

    fn create_virtual_machine(
        &self,
        _group: &str,
        deployment: &VmDeployment,
    ) -> Result<RemoteResource, RemoteError> {
        self.tick();
        Ok(RemoteResource {
            id: format!("/vms/{}", deployment.name),
        })
    }

    fn get_virtual_machine(
        &self,
        _group: &str,
        name: &str,
    ) -> Result<VirtualMachineView, RemoteError> {
        self.tick();
        Err(RemoteError::NotFound(format!("virtual machine {name}")))
    }

    fn get_public_ip(&self, _group: &str, name: &str) -> Result<PublicIpAddress, RemoteError> {
        self.tick();
        Ok(PublicIpAddress {
            id: format!("/ips/{name}"),
            ip_address: Some("203.0.113.7".to_string()),
        })
    }

    fn restart_virtual_machine(&self, _group: &str, _name: &str) -> Result<(), RemoteError> {
        self.tick();
        Ok(())
    }

    fn run_command(
        &self,
        _group: &str,
        _vm_name: &str,
        command: &GuestCommand,
    ) -> Result<GuestOutput, RemoteError> {
        self.tick();
        *self.last_command.lock().expect("command lock") = Some(command.clone());
        Ok(GuestOutput {
            stdout: self.guest_stdout.clone(),
            stderr: self.guest_stderr.clone(),
        })
    }
}

/// Builds a dispatcher over the given stub.
fn dispatcher(ops: Arc<StubOps>) -> Dispatcher {
    Dispatcher::new(ToolCatalog::standard().expect("catalog"), ops)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn unknown_tools_produce_failure_envelopes() {
    let ops = Arc::new(StubOps::default());
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch("reboot_everything", &json!({}));
    assert_eq!(envelope.outcome, Outcome::Failure);
    assert!(envelope.message.contains("reboot_everything"));
    assert_eq!(ops.calls(), 0);
}

#[test]
fn validation_failures_never_reach_the_control_plane() {
    let ops = Arc::new(StubOps::default());
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "deploy_vm",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "web-01",
            "admin_password": "Sup3r$ecret-pass",
            "bogus": "value"
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Failure);
    assert!(envelope.message.contains("unknown parameter"));
    assert_eq!(ops.calls(), 0);
}

#[test]
fn non_object_arguments_are_rejected_without_remote_calls() {
    let ops = Arc::new(StubOps::default());
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch("restart_vm", &json!("not an object"));
    assert_eq!(envelope.outcome, Outcome::Failure);
    assert_eq!(ops.calls(), 0);
}

#[test]
fn deploy_runs_the_full_pipeline_and_reports_the_address() {
    let ops = Arc::new(StubOps::default());
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "deploy_vm",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "web-01",
            "admin_password": "Sup3r$ecret-pass"
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Success);
    assert!(envelope.message.contains("203.0.113.7"));
    assert!(envelope.message.contains("ssh azureuser@203.0.113.7"));
    assert_eq!(ops.calls(), 7);
    let data = envelope.data.expect("summary data");
    assert_eq!(data["summary"]["virtual_network"], json!("web-01-vnet"));
}

#[test]
fn restart_of_missing_vm_is_a_failure_envelope() {
    let ops = Arc::new(StubOps::default());
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "restart_vm",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "gone"
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Failure);
    assert!(envelope.message.contains("resource not found"));
    // Existence check only; the restart itself is never issued.
    assert_eq!(ops.calls(), 1);
}

#[test]
fn restart_service_ships_the_os_specific_script() {
    let ops = Arc::new(StubOps {
        guest_stdout: "✅ Service restarted successfully!".to_string(),
        ..StubOps::default()
    });
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "restart_service",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "web-01",
            "service_name": "nginx",
            "os_type": "linux"
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Success);
    let command = ops.last_command.lock().expect("command lock").clone().expect("command");
    assert_eq!(command.command_id, "RunShellScript");
    assert!(command.script.contains("SERVICE_NAME=\"nginx\""));
}

#[test]
fn hostile_service_names_are_rejected_before_any_remote_call() {
    let ops = Arc::new(StubOps::default());
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "restart_service",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "web-01",
            "service_name": "nginx; rm -rf /"
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Failure);
    assert_eq!(ops.calls(), 0);
}

#[test]
fn process_utilization_parses_guest_json_into_the_envelope() {
    let ops = Arc::new(StubOps {
        guest_stdout: r#"{"success":true,"processes":[{"process_name":"x","cpu_percent":12.5}]}"#
            .to_string(),
        ..StubOps::default()
    });
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "get_process_utilization",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "web-01",
            "os_type": "linux",
            "sample_seconds": 2,
            "top_n": 3
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Success);
    let data = envelope.data.expect("document");
    assert_eq!(data["processes"][0]["cpu_percent"], json!(12.5));
    let command = ops.last_command.lock().expect("command lock").clone().expect("command");
    assert!(command.script.contains("SAMPLE_SECONDS=2"));
    assert!(command.script.contains("TOP_N=3"));
}

#[test]
fn garbage_guest_output_becomes_a_failure_with_raw_text() {
    let ops = Arc::new(StubOps {
        guest_stdout: "garbage".to_string(),
        ..StubOps::default()
    });
    let dispatcher = dispatcher(Arc::clone(&ops));
    let envelope = dispatcher.dispatch(
        "get_process_utilization",
        &json!({
            "resource_group": "ops-rg",
            "vm_name": "web-01"
        }),
    );
    assert_eq!(envelope.outcome, Outcome::Failure);
    let data = envelope.data.expect("failure data");
    assert_eq!(data["raw_output"], json!("garbage"));
}
