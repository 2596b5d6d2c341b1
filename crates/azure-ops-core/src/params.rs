// crates/azure-ops-core/src/params.rs
// ============================================================================
// Module: Parameter Validation
// Description: Validates call arguments against tool parameter declarations.
// Purpose: Reject malformed calls before any remote operation is issued.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The validator checks an incoming argument map against a tool's parameter
//! declarations: required fields must be present, optional fields are
//! defaulted, enum values must come from the allow-list, and undeclared keys
//! are rejected outright. No coercion happens across kinds; a string is never
//! silently parsed as an integer. Each error identifies exactly one offending
//! field so callers can correct calls without guessing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::ParamKind;
use crate::catalog::ParameterSpec;
use crate::catalog::ToolSpec;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Validation failures for a single call argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingRequired(String),
    /// An enum parameter received a value outside its allow-list.
    #[error("parameter {parameter} must be one of [{allowed}]")]
    InvalidEnum {
        /// Offending parameter name.
        parameter: String,
        /// Comma-joined allow-list for the parameter.
        allowed: String,
    },
    /// An argument key does not match any declared parameter.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    /// A value had the wrong kind for its declaration.
    #[error("parameter {parameter} must be a {expected}")]
    InvalidKind {
        /// Offending parameter name.
        parameter: String,
        /// Expected kind label.
        expected: &'static str,
    },
    /// An integer value fell below the declared minimum.
    #[error("parameter {parameter} must be at least {minimum}")]
    BelowMinimum {
        /// Offending parameter name.
        parameter: String,
        /// Declared minimum value.
        minimum: i64,
    },
    /// Validated arguments failed to decode into the typed request shape.
    #[error("invalid arguments: {0}")]
    Decode(String),
}

// ============================================================================
// SECTION: Validated Arguments
// ============================================================================

/// Argument map that passed validation, with defaults substituted.
#[derive(Debug, Clone)]
pub struct ValidatedArgs {
    /// Validated values keyed by parameter name.
    values: Map<String, Value>,
}

impl ValidatedArgs {
    /// Decodes the validated arguments into a typed request shape.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Decode`] when the typed shape cannot be
    /// constructed from the validated map.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ValidationError> {
        serde_json::from_value(Value::Object(self.values))
            .map_err(|err| ValidationError::Decode(err.to_string()))
    }

    /// Returns a validated value by parameter name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates an argument map against a tool specification.
///
/// # Errors
///
/// Returns [`ValidationError`] identifying the first offending field.
pub fn validate(
    spec: &ToolSpec,
    arguments: &Map<String, Value>,
) -> Result<ValidatedArgs, ValidationError> {
    for key in arguments.keys() {
        if !spec.parameters.iter().any(|parameter| parameter.name == key) {
            return Err(ValidationError::UnknownParameter(key.clone()));
        }
    }
    let mut values = Map::new();
    for parameter in &spec.parameters {
        match arguments.get(parameter.name) {
            Some(value) => {
                check_kind(parameter, value)?;
                values.insert(parameter.name.to_string(), value.clone());
            }
            None if parameter.required => {
                return Err(ValidationError::MissingRequired(parameter.name.to_string()));
            }
            None => {
                if let Some(default) = &parameter.default {
                    values.insert(parameter.name.to_string(), default.clone());
                }
            }
        }
    }
    Ok(ValidatedArgs {
        values,
    })
}

/// Checks a supplied value against a parameter declaration.
fn check_kind(parameter: &ParameterSpec, value: &Value) -> Result<(), ValidationError> {
    match parameter.kind {
        ParamKind::String => {
            if !value.is_string() {
                return Err(ValidationError::InvalidKind {
                    parameter: parameter.name.to_string(),
                    expected: "string",
                });
            }
            Ok(())
        }
        ParamKind::Integer => {
            let Some(number) = value.as_i64() else {
                return Err(ValidationError::InvalidKind {
                    parameter: parameter.name.to_string(),
                    expected: "integer",
                });
            };
            if let Some(minimum) = parameter.minimum
                && number < minimum
            {
                return Err(ValidationError::BelowMinimum {
                    parameter: parameter.name.to_string(),
                    minimum,
                });
            }
            Ok(())
        }
        ParamKind::Enum => {
            let Some(text) = value.as_str() else {
                return Err(ValidationError::InvalidKind {
                    parameter: parameter.name.to_string(),
                    expected: "string",
                });
            };
            if !parameter.allowed_values.contains(&text) {
                return Err(ValidationError::InvalidEnum {
                    parameter: parameter.name.to_string(),
                    allowed: parameter.allowed_values.join(", "),
                });
            }
            Ok(())
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
