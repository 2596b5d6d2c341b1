// crates/azure-ops-arm/src/client.rs
// ============================================================================
// Module: ARM Client
// Description: Azure Resource Manager REST client for the tool pipelines.
// Purpose: Implement the remote-resource interface over the management plane.
// Dependencies: azure-ops-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Implements [`ResourceOps`] against the Azure Resource Manager REST
//! surface. Create-or-update, restart, and run-command are long-running
//! operations; this client hides the polling entirely, so each trait method
//! blocks until the operation reaches a terminal state. Provider error text
//! is preserved verbatim for the envelope; transport errors are reported
//! with stable messages that cannot leak request contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;
use std::time::Duration;

use azure_ops_core::client::GuestCommand;
use azure_ops_core::client::GuestOutput;
use azure_ops_core::client::OsType;
use azure_ops_core::client::PublicIpAddress;
use azure_ops_core::client::RemoteError;
use azure_ops_core::client::RemoteResource;
use azure_ops_core::client::ResourceOps;
use azure_ops_core::client::VirtualMachineView;
use azure_ops_core::client::VmDeployment;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::HeaderMap;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::credentials::Credentials;
use crate::token::TokenProvider;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Azure management plane endpoint.
const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
/// API version for resource group operations.
const RESOURCE_API_VERSION: &str = "2022-09-01";
/// API version for network operations.
const NETWORK_API_VERSION: &str = "2023-04-01";
/// API version for compute operations.
const COMPUTE_API_VERSION: &str = "2023-07-01";
/// Connect timeout for management plane requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Overall timeout for a single management plane request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Default interval between long-running-operation polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Maximum number of polls before an operation is declared stuck.
const MAX_POLL_ATTEMPTS: u32 = 120;

// ============================================================================
// SECTION: Construction
// ============================================================================

/// ARM client construction errors.
#[derive(Debug, Error)]
pub enum ArmClientError {
    /// The underlying HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
}

/// Blocking Azure Resource Manager client.
pub struct ArmClient {
    /// HTTP client for management plane requests.
    http: Client,
    /// Bearer token provider.
    tokens: TokenProvider,
    /// Target subscription identifier.
    subscription_id: String,
    /// Interval between long-running-operation polls.
    poll_interval: Duration,
}

impl ArmClient {
    /// Builds an ARM client from client-secret credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ArmClientError`] when the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, ArmClientError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ArmClientError::Build(err.to_string()))?;
        let subscription_id = credentials.subscription_id.clone();
        let tokens = TokenProvider::new(http.clone(), credentials);
        Ok(Self {
            http,
            tokens,
            subscription_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Returns the subscription targeted by this client.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }
}

// ============================================================================
// SECTION: Request Plumbing
// ============================================================================

impl ArmClient {
    /// Builds a full management plane URL for a resource path.
    fn url(&self, path: &str, api_version: &str) -> String {
        format!("{MANAGEMENT_ENDPOINT}{path}?api-version={api_version}")
    }

    /// Returns the subscription-scoped path for a resource group.
    fn group_path(&self, group: &str) -> String {
        format!("/subscriptions/{}/resourceGroups/{group}", self.subscription_id)
    }

    /// Returns a bearer token for the management plane.
    fn bearer(&self) -> Result<String, RemoteError> {
        self.tokens.bearer().map_err(|err| RemoteError::Auth(err.to_string()))
    }

    /// Issues a GET against a full URL.
    fn get_url(&self, url: &str) -> Result<Response, RemoteError> {
        let token = self.bearer()?;
        self.http.get(url).bearer_auth(token).send().map_err(map_send_error)
    }

    /// Issues a PUT with a JSON body against a full URL.
    fn put_url(&self, url: &str, body: &Value) -> Result<Response, RemoteError> {
        let token = self.bearer()?;
        self.http.put(url).bearer_auth(token).json(body).send().map_err(map_send_error)
    }

    /// Issues a POST with an optional JSON body against a full URL.
    fn post_url(&self, url: &str, body: Option<&Value>) -> Result<Response, RemoteError> {
        let token = self.bearer()?;
        let mut builder = self.http.post(url).bearer_auth(token);
        if let Some(body) = body {
            builder = builder.json(body);
        } else {
            builder = builder.header(reqwest::header::CONTENT_LENGTH, 0);
        }
        builder.send().map_err(map_send_error)
    }

    /// Creates or updates a resource and waits for provisioning to finish.
    fn put_resource(
        &self,
        path: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<Value, RemoteError> {
        let url = self.url(path, api_version);
        let response = self.put_url(&url, body)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        match status {
            200 | 201 => {
                let body = decode_json(response)?;
                match provisioning_state(&body) {
                    None | Some("Succeeded") => Ok(body),
                    Some(state @ ("Failed" | "Canceled")) => Err(RemoteError::Operation(
                        format!("provisioning ended in state {state} for {path}"),
                    )),
                    Some(_) => {
                        if let Some(operation) = operation_url(&headers) {
                            self.poll_operation(&operation)?;
                        }
                        self.poll_resource(&url)
                    }
                }
            }
            202 => {
                if let Some(operation) = operation_url(&headers) {
                    self.poll_operation(&operation)?;
                }
                self.poll_resource(&url)
            }
            _ => Err(api_error(status, response)),
        }
    }

    /// Reads a resource, mapping 404 to [`RemoteError::NotFound`].
    fn get_resource(&self, path: &str, api_version: &str) -> Result<Value, RemoteError> {
        let url = self.url(path, api_version);
        let response = self.get_url(&url)?;
        let status = response.status().as_u16();
        match status {
            200 => decode_json(response),
            404 => Err(RemoteError::NotFound(path.to_string())),
            _ => Err(api_error(status, response)),
        }
    }

    /// Polls a resource URL until provisioning reaches a terminal state.
    fn poll_resource(&self, url: &str) -> Result<Value, RemoteError> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            thread::sleep(self.poll_interval);
            let response = self.get_url(url)?;
            let status = response.status().as_u16();
            if status != 200 {
                return Err(api_error(status, response));
            }
            let body = decode_json(response)?;
            match provisioning_state(&body) {
                None | Some("Succeeded") => return Ok(body),
                Some("Failed" | "Canceled") => {
                    return Err(RemoteError::Operation(format!(
                        "provisioning failed for {url}"
                    )));
                }
                Some(_) => {}
            }
        }
        Err(RemoteError::Operation(format!(
            "provisioning did not complete after {MAX_POLL_ATTEMPTS} polls"
        )))
    }

    /// Polls an async-operation URL until it reaches a terminal state.
    fn poll_operation(&self, url: &str) -> Result<Value, RemoteError> {
        for _ in 0..MAX_POLL_ATTEMPTS {
            let response = self.get_url(url)?;
            let status_code = response.status().as_u16();
            if status_code == 202 {
                thread::sleep(retry_after(response.headers(), self.poll_interval));
                continue;
            }
            if status_code != 200 {
                return Err(api_error(status_code, response));
            }
            let headers = response.headers().clone();
            let body = decode_json(response)?;
            match body.get("status").and_then(Value::as_str) {
                Some("Succeeded") => return Ok(body),
                Some("Failed" | "Canceled") => {
                    let message = body
                        .get("error")
                        .and_then(|error| error.get("message"))
                        .and_then(Value::as_str)
                        .unwrap_or("operation failed without detail");
                    return Err(RemoteError::Operation(message.to_string()));
                }
                _ => thread::sleep(retry_after(&headers, self.poll_interval)),
            }
        }
        Err(RemoteError::Operation(format!(
            "operation did not complete after {MAX_POLL_ATTEMPTS} polls"
        )))
    }
}

// ============================================================================
// SECTION: Response Helpers
// ============================================================================

/// Maps reqwest send errors to stable transport messages.
fn map_send_error(error: reqwest::Error) -> RemoteError {
    if error.is_timeout() {
        RemoteError::Transport("request timed out".to_string())
    } else if error.is_connect() {
        RemoteError::Transport("connection failed".to_string())
    } else {
        RemoteError::Transport("request failed".to_string())
    }
}

/// Decodes a JSON response body.
fn decode_json(response: Response) -> Result<Value, RemoteError> {
    response
        .json()
        .map_err(|_| RemoteError::Transport("response body was not valid JSON".to_string()))
}

/// Builds an API error preserving the provider's message verbatim.
fn api_error(status: u16, response: Response) -> RemoteError {
    let text = response.text().unwrap_or_default();
    RemoteError::Api {
        status,
        message: extract_error_message(&text),
    }
}

/// Extracts the provider error message from a response body.
fn extract_error_message(text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(text) {
        if let Some(message) = body
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    if text.trim().is_empty() {
        return "no error detail returned".to_string();
    }
    text.to_string()
}

/// Reads the async-operation URL from response headers.
fn operation_url(headers: &HeaderMap) -> Option<String> {
    for name in ["azure-asyncoperation", "location"] {
        if let Some(value) = headers.get(name).and_then(|value| value.to_str().ok()) {
            return Some(value.to_string());
        }
    }
    None
}

/// Reads the server-suggested poll delay, falling back to a default.
fn retry_after(headers: &HeaderMap, fallback: Duration) -> Duration {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(fallback, Duration::from_secs)
}

/// Reads the provisioning state from a resource body.
fn provisioning_state(body: &Value) -> Option<&str> {
    body.get("properties")
        .and_then(|properties| properties.get("provisioningState"))
        .and_then(Value::as_str)
}

/// Extracts a resource identifier, falling back to the request path.
fn resource_id(body: &Value, fallback: &str) -> String {
    body.get("id").and_then(Value::as_str).map_or_else(|| fallback.to_string(), str::to_string)
}

/// Returns the image reference for a guest OS family.
fn image_reference(os_type: OsType) -> Value {
    match os_type {
        OsType::Linux => json!({
            "publisher": "Canonical",
            "offer": "0001-com-ubuntu-server-jammy",
            "sku": "22_04-lts-gen2",
            "version": "latest"
        }),
        OsType::Windows => json!({
            "publisher": "MicrosoftWindowsServer",
            "offer": "WindowsServer",
            "sku": "2022-datacenter-azure-edition",
            "version": "latest"
        }),
    }
}

/// Decodes run-command output from either response shape.
///
/// Synchronous responses carry the status array at `value`; async-operation
/// results nest it under `properties.output.value`.
fn decode_run_command_output(body: &Value) -> GuestOutput {
    let entries = body
        .get("value")
        .or_else(|| {
            body.get("properties")
                .and_then(|properties| properties.get("output"))
                .and_then(|output| output.get("value"))
        })
        .and_then(Value::as_array);
    let mut output = GuestOutput::default();
    let Some(entries) = entries else {
        return output;
    };
    for entry in entries {
        let code = entry.get("code").and_then(Value::as_str).unwrap_or_default();
        let message = entry.get("message").and_then(Value::as_str).unwrap_or_default();
        if code.contains("StdOut") {
            output.stdout.push_str(message);
        } else if code.contains("StdErr") {
            output.stderr.push_str(message);
        }
    }
    output
}

// ============================================================================
// SECTION: Resource Operations
// ============================================================================

impl ResourceOps for ArmClient {
    fn ensure_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> Result<RemoteResource, RemoteError> {
        let path = self.group_path(name);
        let body = self.put_resource(
            &path,
            RESOURCE_API_VERSION,
            &json!({
                "location": location
            }),
        )?;
        Ok(RemoteResource {
            id: resource_id(&body, &path),
        })
    }

    fn create_virtual_network(
        &self,
        group: &str,
        name: &str,
        location: &str,
        address_space: &str,
    ) -> Result<RemoteResource, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Network/virtualNetworks/{name}",
            self.group_path(group)
        );
        let body = self.put_resource(
            &path,
            NETWORK_API_VERSION,
            &json!({
                "location": location,
                "properties": {
                    "addressSpace": {
                        "addressPrefixes": [address_space]
                    }
                }
            }),
        )?;
        Ok(RemoteResource {
            id: resource_id(&body, &path),
        })
    }

    fn create_subnet(
        &self,
        group: &str,
        virtual_network: &str,
        name: &str,
        address_prefix: &str,
    ) -> Result<RemoteResource, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Network/virtualNetworks/{virtual_network}/subnets/{name}",
            self.group_path(group)
        );
        let body = self.put_resource(
            &path,
            NETWORK_API_VERSION,
            &json!({
                "properties": {
                    "addressPrefix": address_prefix
                }
            }),
        )?;
        Ok(RemoteResource {
            id: resource_id(&body, &path),
        })
    }

    fn create_public_ip(
        &self,
        group: &str,
        name: &str,
        location: &str,
    ) -> Result<RemoteResource, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Network/publicIPAddresses/{name}",
            self.group_path(group)
        );
        let body = self.put_resource(
            &path,
            NETWORK_API_VERSION,
            &json!({
                "location": location,
                "sku": {
                    "name": "Standard"
                },
                "properties": {
                    "publicIPAllocationMethod": "Static",
                    "publicIPAddressVersion": "IPv4"
                }
            }),
        )?;
        Ok(RemoteResource {
            id: resource_id(&body, &path),
        })
    }

    fn create_network_interface(
        &self,
        group: &str,
        name: &str,
        location: &str,
        subnet_id: &str,
        public_ip_id: &str,
    ) -> Result<RemoteResource, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Network/networkInterfaces/{name}",
            self.group_path(group)
        );
        let body = self.put_resource(
            &path,
            NETWORK_API_VERSION,
            &json!({
                "location": location,
                "properties": {
                    "ipConfigurations": [{
                        "name": "ipconfig1",
                        "properties": {
                            "subnet": { "id": subnet_id },
                            "publicIPAddress": { "id": public_ip_id }
                        }
                    }]
                }
            }),
        )?;
        Ok(RemoteResource {
            id: resource_id(&body, &path),
        })
    }

    fn create_virtual_machine(
        &self,
        group: &str,
        deployment: &VmDeployment,
    ) -> Result<RemoteResource, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Compute/virtualMachines/{}",
            self.group_path(group),
            deployment.name
        );
        let body = self.put_resource(
            &path,
            COMPUTE_API_VERSION,
            &json!({
                "location": deployment.location,
                "properties": {
                    "hardwareProfile": {
                        "vmSize": deployment.size
                    },
                    "storageProfile": {
                        "imageReference": image_reference(deployment.os_type),
                        "osDisk": {
                            "createOption": "FromImage",
                            "managedDisk": {
                                "storageAccountType": "Premium_LRS"
                            }
                        }
                    },
                    "osProfile": {
                        "computerName": deployment.name,
                        "adminUsername": deployment.admin_username,
                        "adminPassword": deployment.admin_password
                    },
                    "networkProfile": {
                        "networkInterfaces": [{
                            "id": deployment.network_interface_id,
                            "properties": {
                                "primary": true
                            }
                        }]
                    }
                }
            }),
        )?;
        Ok(RemoteResource {
            id: resource_id(&body, &path),
        })
    }

    fn get_virtual_machine(
        &self,
        group: &str,
        name: &str,
    ) -> Result<VirtualMachineView, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Compute/virtualMachines/{name}",
            self.group_path(group)
        );
        let body = self.get_resource(&path, COMPUTE_API_VERSION)?;
        Ok(VirtualMachineView {
            id: resource_id(&body, &path),
            name: body
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            location: body
                .get("location")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    fn get_public_ip(&self, group: &str, name: &str) -> Result<PublicIpAddress, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Network/publicIPAddresses/{name}",
            self.group_path(group)
        );
        let body = self.get_resource(&path, NETWORK_API_VERSION)?;
        let ip_address = body
            .get("properties")
            .and_then(|properties| properties.get("ipAddress"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(PublicIpAddress {
            id: resource_id(&body, &path),
            ip_address,
        })
    }

    fn restart_virtual_machine(&self, group: &str, name: &str) -> Result<(), RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Compute/virtualMachines/{name}/restart",
            self.group_path(group)
        );
        let url = self.url(&path, COMPUTE_API_VERSION);
        let response = self.post_url(&url, None)?;
        let status = response.status().as_u16();
        match status {
            200 | 204 => Ok(()),
            202 => {
                if let Some(operation) = operation_url(response.headers()) {
                    self.poll_operation(&operation)?;
                }
                Ok(())
            }
            404 => Err(RemoteError::NotFound(path)),
            _ => Err(api_error(status, response)),
        }
    }

    fn run_command(
        &self,
        group: &str,
        vm_name: &str,
        command: &GuestCommand,
    ) -> Result<GuestOutput, RemoteError> {
        let path = format!(
            "{}/providers/Microsoft.Compute/virtualMachines/{vm_name}/runCommand",
            self.group_path(group)
        );
        let url = self.url(&path, COMPUTE_API_VERSION);
        let script_lines: Vec<&str> = command.script.lines().collect();
        let body = json!({
            "commandId": command.command_id,
            "script": script_lines
        });
        let response = self.post_url(&url, Some(&body))?;
        let status = response.status().as_u16();
        match status {
            200 => {
                let body = decode_json(response)?;
                Ok(decode_run_command_output(&body))
            }
            202 => {
                let operation = operation_url(response.headers()).ok_or_else(|| {
                    RemoteError::Operation(
                        "run-command accepted without an operation URL".to_string(),
                    )
                })?;
                let final_body = self.poll_operation(&operation)?;
                Ok(decode_run_command_output(&final_body))
            }
            404 => Err(RemoteError::NotFound(path)),
            _ => Err(api_error(status, response)),
        }
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

    use serde_json::json;

    use super::*;

    #[test]
    fn run_command_output_maps_component_status_codes() {
        let body = json!({
            "value": [
                { "code": "ComponentStatus/StdOut/succeeded", "message": "✅ restarted" },
                { "code": "ComponentStatus/StdErr/succeeded", "message": "warning text" }
            ]
        });
        let output = decode_run_command_output(&body);
        assert_eq!(output.stdout, "✅ restarted");
        assert_eq!(output.stderr, "warning text");
    }

    #[test]
    fn run_command_output_reads_the_async_operation_shape() {
        let body = json!({
            "status": "Succeeded",
            "properties": {
                "output": {
                    "value": [
                        { "code": "ComponentStatus/StdOut/succeeded", "message": "{\"success\":true}" }
                    ]
                }
            }
        });
        let output = decode_run_command_output(&body);
        assert_eq!(output.stdout, "{\"success\":true}");
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn run_command_output_tolerates_missing_entries() {
        let output = decode_run_command_output(&json!({}));
        assert!(output.stdout.is_empty());
        assert!(output.stderr.is_empty());
    }

    #[test]
    fn provider_error_messages_are_extracted_verbatim() {
        let text = r#"{"error":{"code":"SkuNotAvailable","message":"The requested size is not available."}}"#;
        assert_eq!(extract_error_message(text), "The requested size is not available.");
    }

    #[test]
    fn unstructured_error_bodies_are_preserved() {
        assert_eq!(extract_error_message("gateway exploded"), "gateway exploded");
        assert_eq!(extract_error_message(""), "no error detail returned");
    }

    #[test]
    fn image_references_follow_the_os_lookup_table() {
        let linux = image_reference(OsType::Linux);
        assert_eq!(linux["publisher"], json!("Canonical"));
        assert_eq!(linux["sku"], json!("22_04-lts-gen2"));
        let windows = image_reference(OsType::Windows);
        assert_eq!(windows["offer"], json!("WindowsServer"));
        assert_eq!(windows["sku"], json!("2022-datacenter-azure-edition"));
    }

    #[test]
    fn provisioning_state_reads_the_nested_property() {
        let body = json!({ "properties": { "provisioningState": "Updating" } });
        assert_eq!(provisioning_state(&body), Some("Updating"));
        assert_eq!(provisioning_state(&json!({})), None);
    }
}
