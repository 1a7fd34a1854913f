//! Mapping fetched payload fields onto environment variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{EnvaultError, Result};
use crate::redaction::MaskedValues;
use crate::secret::SecretPayload;

/// Declares that one payload field lands in one environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FieldMapping {
    /// Payload field to read.
    #[validate(length(min = 1, message = "data_field must not be empty"))]
    pub data_field: String,
    /// Target variable name, appended to the trimmed global prefix. May be
    /// empty as long as the prefix alone yields a non-blank name.
    pub env_var: String,
}

impl FieldMapping {
    /// Maps `data_field` onto `env_var`.
    pub fn new(data_field: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self { data_field: data_field.into(), env_var: env_var.into() }
    }
}

/// What to do when a mapped data field is absent from the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Export the variable with an empty value.
    #[default]
    WriteEmpty,
    /// Leave the variable untouched.
    Skip,
    /// Abort the request with [`EnvaultError::FieldNotFound`].
    Fail,
}

impl fmt::Display for MissingFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteEmpty => write!(f, "write_empty"),
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for MissingFieldPolicy {
    type Err = EnvaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "write_empty" => Ok(Self::WriteEmpty),
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(EnvaultError::configuration(format!(
                "unknown missing-field policy '{}', expected write_empty, skip, or fail",
                other
            ))),
        }
    }
}

/// One resolved environment write.
///
/// The value is usually a secret; Debug shows the name only.
#[derive(Clone, PartialEq, Eq)]
pub struct EnvAssignment {
    /// Final variable name, prefix included.
    pub name: String,
    /// Value to export.
    pub value: String,
}

impl fmt::Debug for EnvAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvAssignment").field("name", &self.name).field("value", &"[REDACTED]").finish()
    }
}

/// Applies `mappings` to a fetched payload, in declaration order.
///
/// Each mapping resolves to `trim(env_prefix) + env_var`; a blank resolved
/// name is a configuration error. Every non-blank value is registered with
/// `masked` before this function returns, so redaction is in force by the
/// time the caller exports anything.
///
/// Duplicate resolved names are kept in order; whoever consumes the
/// assignments last-write-wins, matching environment map semantics.
///
/// # Errors
///
/// - [`EnvaultError::Configuration`] when a resolved name is blank.
/// - [`EnvaultError::FieldNotFound`] when a field is absent and `policy` is
///   [`MissingFieldPolicy::Fail`].
pub fn apply_mappings(
    payload: &SecretPayload,
    mappings: &[FieldMapping],
    env_prefix: &str,
    policy: MissingFieldPolicy,
    masked: &MaskedValues,
) -> Result<Vec<EnvAssignment>> {
    let prefix = env_prefix.trim();
    let mut assignments = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let name = format!("{}{}", prefix, mapping.env_var);
        if name.trim().is_empty() {
            return Err(EnvaultError::configuration(format!(
                "mapping for data field '{}' resolves to a blank variable name",
                mapping.data_field
            )));
        }

        let value = match payload.field(&mapping.data_field) {
            Some(value) => value.to_string(),
            None => match policy {
                MissingFieldPolicy::WriteEmpty => {
                    tracing::warn!(
                        field = %mapping.data_field,
                        variable = %name,
                        "data field missing from payload, exporting empty value"
                    );
                    String::new()
                }
                MissingFieldPolicy::Skip => {
                    tracing::warn!(
                        field = %mapping.data_field,
                        variable = %name,
                        "data field missing from payload, skipping mapping"
                    );
                    continue;
                }
                MissingFieldPolicy::Fail => {
                    return Err(EnvaultError::field_not_found(&mapping.data_field));
                }
            },
        };

        masked.insert(&value);
        assignments.push(EnvAssignment { name, value });
    }

    Ok(assignments)
}
