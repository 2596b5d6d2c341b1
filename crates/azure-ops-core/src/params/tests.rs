// crates/azure-ops-core/src/params/tests.rs
// ============================================================================
// Module: Parameter Validation Unit Tests
// Description: Unit and property tests for argument validation.
// Purpose: Validate defaulting, enum checks, and fail-closed key handling.
// Dependencies: azure-ops-core, proptest
// ============================================================================

//! ## Overview
//! Exercises the validator against the standard catalog: required/optional
//! totality, enum allow-lists, kind checks, and unknown-key rejection for
//! arbitrary argument maps.

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

use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use super::*;
use crate::catalog::ToolCatalog;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns the standard catalog for validator tests.
fn catalog() -> ToolCatalog {
    ToolCatalog::standard().expect("standard catalog")
}

/// Returns a minimal valid argument map for `deploy_vm`.
fn deploy_args() -> Map<String, Value> {
    let Value::Object(map) = json!({
        "resource_group": "ops-rg",
        "vm_name": "web-01",
        "admin_password": "Sup3r$ecret-pass"
    }) else {
        panic!("fixture must be an object");
    };
    map
}

// ============================================================================
// SECTION: Unit Tests
// ============================================================================

#[test]
fn optional_parameters_are_defaulted() {
    let catalog = catalog();
    let spec = catalog.lookup("deploy_vm").expect("spec");
    let validated = validate(spec, &deploy_args()).expect("valid arguments");
    assert_eq!(validated.get("location"), Some(&json!("eastus")));
    assert_eq!(validated.get("vm_size"), Some(&json!("Standard_B2s")));
    assert_eq!(validated.get("admin_username"), Some(&json!("azureuser")));
    assert_eq!(validated.get("os_type"), Some(&json!("linux")));
}

#[test]
fn missing_required_parameter_is_reported_by_name() {
    let catalog = catalog();
    let spec = catalog.lookup("deploy_vm").expect("spec");
    let mut args = deploy_args();
    args.remove("admin_password");
    let error = validate(spec, &args).expect_err("missing password");
    assert_eq!(error, ValidationError::MissingRequired("admin_password".to_string()));
}

#[test]
fn enum_value_outside_allow_list_is_rejected() {
    let catalog = catalog();
    let spec = catalog.lookup("deploy_vm").expect("spec");
    let mut args = deploy_args();
    args.insert("os_type".to_string(), json!("freebsd"));
    let error = validate(spec, &args).expect_err("bad os_type");
    assert_eq!(
        error,
        ValidationError::InvalidEnum {
            parameter: "os_type".to_string(),
            allowed: "linux, windows".to_string(),
        }
    );
}

#[test]
fn strings_are_never_coerced_to_integers() {
    let catalog = catalog();
    let spec = catalog.lookup("get_process_utilization").expect("spec");
    let Value::Object(mut args) = json!({
        "resource_group": "ops-rg",
        "vm_name": "web-01"
    }) else {
        panic!("fixture must be an object");
    };
    args.insert("sample_seconds".to_string(), json!("5"));
    let error = validate(spec, &args).expect_err("string sample_seconds");
    assert_eq!(
        error,
        ValidationError::InvalidKind {
            parameter: "sample_seconds".to_string(),
            expected: "integer",
        }
    );
}

#[test]
fn integers_below_the_minimum_are_rejected() {
    let catalog = catalog();
    let spec = catalog.lookup("get_process_utilization").expect("spec");
    let Value::Object(mut args) = json!({
        "resource_group": "ops-rg",
        "vm_name": "web-01"
    }) else {
        panic!("fixture must be an object");
    };
    args.insert("top_n".to_string(), json!(0));
    let error = validate(spec, &args).expect_err("zero top_n");
    assert_eq!(
        error,
        ValidationError::BelowMinimum {
            parameter: "top_n".to_string(),
            minimum: 1,
        }
    );
}

#[test]
fn validated_arguments_decode_into_typed_requests() {
    let catalog = catalog();
    let spec = catalog.lookup("restart_vm").expect("spec");
    let Value::Object(args) = json!({
        "resource_group": "ops-rg",
        "vm_name": "web-01"
    }) else {
        panic!("fixture must be an object");
    };
    let validated = validate(spec, &args).expect("valid arguments");
    let request: crate::orchestrate::RestartVmRequest = validated.decode().expect("decode");
    assert_eq!(request.resource_group, "ops-rg");
    assert_eq!(request.vm_name, "web-01");
}

// ============================================================================
// SECTION: Property Tests
// ============================================================================

proptest! {
    #[test]
    fn unknown_keys_are_always_rejected(key in "[a-z_]{1,24}", value in "[a-zA-Z0-9]{0,16}") {
        let catalog = catalog();
        let spec = catalog.lookup("deploy_vm").expect("spec");
        prop_assume!(!spec.parameters.iter().any(|parameter| parameter.name == key));
        let mut args = deploy_args();
        args.insert(key.clone(), Value::String(value));
        let error = validate(spec, &args).expect_err("unknown key must fail");
        prop_assert_eq!(error, ValidationError::UnknownParameter(key));
    }

    #[test]
    fn valid_calls_always_produce_every_declared_field(
        location in "[a-z]{4,12}",
        size in "Standard_[A-Z][0-9]s",
    ) {
        let catalog = catalog();
        let spec = catalog.lookup("deploy_vm").expect("spec");
        let mut args = deploy_args();
        args.insert("location".to_string(), Value::String(location));
        args.insert("vm_size".to_string(), Value::String(size));
        let validated = validate(spec, &args).expect("valid arguments");
        for parameter in &spec.parameters {
            prop_assert!(validated.get(parameter.name).is_some());
        }
    }
}
