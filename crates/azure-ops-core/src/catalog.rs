// crates/azure-ops-core/src/catalog.rs
// ============================================================================
// Module: Tool Catalog
// Description: Static registry of the MCP tool surface.
// Purpose: Declare tool names, parameter schemas, and listing metadata.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The catalog declares the fixed tool surface exposed by the server. Tools
//! are registered once at startup in a stable order; duplicate names and
//! malformed parameter declarations fail fast at construction rather than at
//! call time. The catalog also renders the JSON input schema served by
//! `tools/list`, derived directly from the parameter declarations so the
//! listing can never drift from what the validator enforces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical MCP tool names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Deploy a virtual machine with its networking stack.
    DeployVm,
    /// Restart an existing virtual machine.
    RestartVm,
    /// Restart a service inside a virtual machine.
    RestartService,
    /// Sample per-process CPU and memory utilization inside a VM.
    GetProcessUtilization,
}

/// All tool names in registration order.
pub const ALL_TOOLS: [ToolName; 4] = [
    ToolName::DeployVm,
    ToolName::RestartVm,
    ToolName::RestartService,
    ToolName::GetProcessUtilization,
];

/// Result surface a tool presents to MCP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSurface {
    /// Free-text result content.
    Text,
    /// JSON document result content.
    Json,
}

impl ToolName {
    /// Parses a tool name from its wire representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "deploy_vm" => Some(Self::DeployVm),
            "restart_vm" => Some(Self::RestartVm),
            "restart_service" => Some(Self::RestartService),
            "get_process_utilization" => Some(Self::GetProcessUtilization),
            _ => None,
        }
    }

    /// Returns the wire representation of the tool name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeployVm => "deploy_vm",
            Self::RestartVm => "restart_vm",
            Self::RestartService => "restart_service",
            Self::GetProcessUtilization => "get_process_utilization",
        }
    }

    /// Returns the content surface the tool presents to clients.
    ///
    /// All tools normalize to the same result envelope internally; the
    /// surface only selects how the envelope is rendered in MCP content.
    #[must_use]
    pub const fn surface(self) -> ToolSurface {
        match self {
            Self::DeployVm | Self::RestartVm | Self::RestartService => ToolSurface::Text,
            Self::GetProcessUtilization => ToolSurface::Json,
        }
    }
}

// ============================================================================
// SECTION: Parameter Declarations
// ============================================================================

/// Parameter kinds accepted by the tool surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Free-form string value.
    String,
    /// Integer value.
    Integer,
    /// String value restricted to an allow-list.
    Enum,
}

/// Declaration of a single tool parameter.
///
/// # Invariants
/// - `allowed_values` is non-empty exactly when `kind` is [`ParamKind::Enum`].
/// - Optional parameters carry a default; checked at catalog construction.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// Parameter name as it appears in call arguments.
    pub name: &'static str,
    /// Parameter kind.
    pub kind: ParamKind,
    /// Whether the parameter must be supplied by the caller.
    pub required: bool,
    /// Default substituted when an optional parameter is absent.
    pub default: Option<Value>,
    /// Allowed values for enum parameters.
    pub allowed_values: &'static [&'static str],
    /// Minimum accepted value for integer parameters.
    pub minimum: Option<i64>,
    /// Human-readable description for the tool listing.
    pub description: &'static str,
}

impl ParameterSpec {
    /// Declares a required string parameter.
    #[must_use]
    pub const fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            required: true,
            default: None,
            allowed_values: &[],
            minimum: None,
            description,
        }
    }

    /// Declares an optional string parameter with a default.
    #[must_use]
    pub fn optional_string(
        name: &'static str,
        default: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            required: false,
            default: Some(Value::String(default.to_string())),
            allowed_values: &[],
            minimum: None,
            description,
        }
    }

    /// Declares an optional enum parameter with a default.
    #[must_use]
    pub fn optional_enum(
        name: &'static str,
        allowed_values: &'static [&'static str],
        default: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Enum,
            required: false,
            default: Some(Value::String(default.to_string())),
            allowed_values,
            minimum: None,
            description,
        }
    }

    /// Declares an optional integer parameter with a default and minimum.
    #[must_use]
    pub fn optional_integer(
        name: &'static str,
        default: i64,
        minimum: i64,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
            required: false,
            default: Some(Value::Number(default.into())),
            allowed_values: &[],
            minimum: Some(minimum),
            description,
        }
    }

    /// Renders the JSON schema fragment for this parameter.
    #[must_use]
    fn schema(&self) -> Value {
        let mut fragment = Map::new();
        let kind = match self.kind {
            ParamKind::String | ParamKind::Enum => "string",
            ParamKind::Integer => "integer",
        };
        fragment.insert("type".to_string(), Value::String(kind.to_string()));
        fragment.insert("description".to_string(), Value::String(self.description.to_string()));
        if !self.allowed_values.is_empty() {
            let allowed =
                self.allowed_values.iter().map(|value| Value::String((*value).to_string()));
            fragment.insert("enum".to_string(), Value::Array(allowed.collect()));
        }
        if let Some(minimum) = self.minimum {
            fragment.insert("minimum".to_string(), Value::Number(minimum.into()));
        }
        if let Some(default) = &self.default {
            fragment.insert("default".to_string(), default.clone());
        }
        Value::Object(fragment)
    }
}

// ============================================================================
// SECTION: Tool Specifications
// ============================================================================

/// Specification of a single tool: identity, description, and parameters.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: &'static str,
    /// Ordered parameter declarations.
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSpec {
    /// Renders the JSON input schema served by `tools/list`.
    ///
    /// Undeclared properties are rejected by the schema as well as by the
    /// validator, so typo'd parameters fail on either side of the wire.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in &self.parameters {
            properties.insert(parameter.name.to_string(), parameter.schema());
            if parameter.required {
                required.push(Value::String(parameter.name.to_string()));
            }
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": Value::Array(required),
            "additionalProperties": false
        })
    }
}

/// Tool definition shape used by MCP tool listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// MCP tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    pub input_schema: Value,
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static tool registry with stable listing order.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    /// Registered tool specifications in registration order.
    tools: Vec<ToolSpec>,
}

/// Catalog construction errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A tool name was registered twice.
    #[error("duplicate tool name: {0}")]
    DuplicateTool(&'static str),
    /// An optional parameter was declared without a default.
    #[error("tool {tool}: optional parameter {parameter} has no default")]
    OptionalWithoutDefault {
        /// Tool carrying the parameter.
        tool: &'static str,
        /// Offending parameter name.
        parameter: &'static str,
    },
}

impl ToolCatalog {
    /// Builds the standard catalog of VM operation tools.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when tool declarations are inconsistent.
    pub fn standard() -> Result<Self, CatalogError> {
        let mut catalog = Self {
            tools: Vec::with_capacity(ALL_TOOLS.len()),
        };
        catalog.register(deploy_vm_spec())?;
        catalog.register(restart_vm_spec())?;
        catalog.register(restart_service_spec())?;
        catalog.register(get_process_utilization_spec())?;
        Ok(catalog)
    }

    /// Registers a tool specification, failing fast on inconsistencies.
    fn register(&mut self, spec: ToolSpec) -> Result<(), CatalogError> {
        if self.tools.iter().any(|existing| existing.name == spec.name) {
            return Err(CatalogError::DuplicateTool(spec.name.as_str()));
        }
        for parameter in &spec.parameters {
            if !parameter.required && parameter.default.is_none() {
                return Err(CatalogError::OptionalWithoutDefault {
                    tool: spec.name.as_str(),
                    parameter: parameter.name,
                });
            }
        }
        self.tools.push(spec);
        Ok(())
    }

    /// Lists registered tools in registration order.
    #[must_use]
    pub fn list(&self) -> &[ToolSpec] {
        &self.tools
    }

    /// Looks up a tool specification by wire name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ToolSpec> {
        let tool = ToolName::parse(name)?;
        self.tools.iter().find(|spec| spec.name == tool)
    }

    /// Returns the MCP tool definitions for tool listing.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|spec| ToolDefinition {
                name: spec.name,
                description: spec.description.to_string(),
                input_schema: spec.input_schema(),
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Tool Declarations
// ============================================================================

/// Builds the `deploy_vm` tool specification.
fn deploy_vm_spec() -> ToolSpec {
    ToolSpec {
        name: ToolName::DeployVm,
        description: "Deploy a new Azure virtual machine with its networking stack (resource \
                      group, virtual network, subnet, public IP, and network interface).",
        parameters: vec![
            ParameterSpec::required_string(
                "resource_group",
                "Resource group name; created when it does not exist.",
            ),
            ParameterSpec::required_string("vm_name", "Name for the virtual machine."),
            ParameterSpec::required_string(
                "admin_password",
                "Administrator password meeting Azure complexity requirements.",
            ),
            ParameterSpec::optional_string(
                "location",
                "eastus",
                "Azure region, e.g. eastus or westus2.",
            ),
            ParameterSpec::optional_string(
                "vm_size",
                "Standard_B2s",
                "VM size, e.g. Standard_B2s or Standard_D2s_v3.",
            ),
            ParameterSpec::optional_string(
                "admin_username",
                "azureuser",
                "Administrator username.",
            ),
            ParameterSpec::optional_enum(
                "os_type",
                &["linux", "windows"],
                "linux",
                "Operating system family for the OS image.",
            ),
        ],
    }
}

/// Builds the `restart_vm` tool specification.
fn restart_vm_spec() -> ToolSpec {
    ToolSpec {
        name: ToolName::RestartVm,
        description: "Restart an existing Azure virtual machine and wait for completion.",
        parameters: vec![
            ParameterSpec::required_string(
                "resource_group",
                "Resource group containing the virtual machine.",
            ),
            ParameterSpec::required_string("vm_name", "Name of the virtual machine to restart."),
        ],
    }
}

/// Builds the `restart_service` tool specification.
fn restart_service_spec() -> ToolSpec {
    ToolSpec {
        name: ToolName::RestartService,
        description: "Restart a service inside an Azure virtual machine (for example tomcat, \
                      MSSQLSERVER, or nginx) via the run-command channel.",
        parameters: vec![
            ParameterSpec::required_string(
                "resource_group",
                "Resource group containing the virtual machine.",
            ),
            ParameterSpec::required_string("vm_name", "Name of the virtual machine."),
            ParameterSpec::required_string("service_name", "Name of the service to restart."),
            ParameterSpec::optional_enum(
                "os_type",
                &["windows", "linux"],
                "windows",
                "Operating system family of the guest.",
            ),
        ],
    }
}

/// Builds the `get_process_utilization` tool specification.
fn get_process_utilization_spec() -> ToolSpec {
    ToolSpec {
        name: ToolName::GetProcessUtilization,
        description: "Sample the top CPU and memory consuming processes inside an Azure virtual \
                      machine and return a JSON document.",
        parameters: vec![
            ParameterSpec::required_string(
                "resource_group",
                "Resource group containing the virtual machine.",
            ),
            ParameterSpec::required_string("vm_name", "Name of the virtual machine."),
            ParameterSpec::optional_enum(
                "os_type",
                &["windows", "linux"],
                "windows",
                "Operating system family of the guest.",
            ),
            ParameterSpec::optional_integer(
                "sample_seconds",
                5,
                1,
                "Sampling period between the two process snapshots, in seconds.",
            ),
            ParameterSpec::optional_integer(
                "top_n",
                15,
                1,
                "Number of top processes to return.",
            ),
        ],
    }
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

    #[test]
    fn standard_catalog_lists_tools_in_registration_order() {
        let catalog = ToolCatalog::standard().expect("catalog");
        let names: Vec<&str> = catalog.list().iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["deploy_vm", "restart_vm", "restart_service", "get_process_utilization"]
        );
    }

    #[test]
    fn duplicate_registration_fails_at_construction() {
        let mut catalog = ToolCatalog {
            tools: Vec::new(),
        };
        catalog.register(restart_vm_spec()).expect("first registration");
        let error = catalog.register(restart_vm_spec()).expect_err("duplicate");
        assert!(matches!(error, CatalogError::DuplicateTool("restart_vm")));
    }

    #[test]
    fn optional_parameter_without_default_is_rejected() {
        let mut catalog = ToolCatalog {
            tools: Vec::new(),
        };
        let spec = ToolSpec {
            name: ToolName::RestartVm,
            description: "broken",
            parameters: vec![ParameterSpec {
                name: "location",
                kind: ParamKind::String,
                required: false,
                default: None,
                allowed_values: &[],
                minimum: None,
                description: "missing default",
            }],
        };
        let error = catalog.register(spec).expect_err("missing default");
        assert!(matches!(
            error,
            CatalogError::OptionalWithoutDefault {
                tool: "restart_vm",
                parameter: "location",
            }
        ));
    }

    #[test]
    fn lookup_rejects_unknown_names() {
        let catalog = ToolCatalog::standard().expect("catalog");
        assert!(catalog.lookup("deploy_vm").is_some());
        assert!(catalog.lookup("deploy_vms").is_none());
    }

    #[test]
    fn input_schema_declares_required_fields_and_rejects_extras() {
        let catalog = ToolCatalog::standard().expect("catalog");
        let spec = catalog.lookup("deploy_vm").expect("deploy_vm spec");
        let schema = spec.input_schema();
        let required = schema["required"]
            .as_array()
            .expect("required array")
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>();
        assert_eq!(required, vec!["resource_group", "vm_name", "admin_password"]);
        assert_eq!(schema["additionalProperties"], Value::Bool(false));
        assert_eq!(schema["properties"]["os_type"]["enum"][0], "linux");
        assert_eq!(schema["properties"]["location"]["default"], "eastus");
    }
}
