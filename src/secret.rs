//! Secure containers for fetched secret material.
//!
//! Nothing in this module leaks a secret through `Debug`, `Display`, or
//! serialization; values come out only through explicit accessors.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{EnvaultError, Result};

/// A string whose contents are redacted everywhere except `expose_secret()`.
///
/// Used for client secrets and session tokens. Debug prints
/// `SecretString([REDACTED])`, Display prints `[REDACTED]`, and serialization
/// emits `"[REDACTED]"`; deserialization accepts plain strings so credential
/// material can still be loaded from host configuration. The backing memory
/// is zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    /// Wraps a sensitive string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Grants access to the underlying value.
    ///
    /// Callers must not log or print the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// True when the wrapped value is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Default for SecretString {
    fn default() -> Self {
        Self::new("")
    }
}

/// A structured secret fetched from the vault: named fields with string values.
///
/// Payloads are fetched fresh per request and never cached. Field values are
/// zeroed when the payload drops; Debug shows field names only.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretPayload {
    fields: HashMap<String, String>,
}

impl SecretPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any previous value under the same name.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Looks up a field value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field names in sorted order, without values.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of fields in the payload.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds a payload from a JSON object, for transports that receive the
    /// vault's data section as raw JSON.
    ///
    /// Strings are taken verbatim, numbers and booleans are stringified,
    /// nulls and nested structures are skipped.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `value` is not a JSON object.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(EnvaultError::configuration("secret payload must be a JSON object"));
        };
        let mut payload = Self::new();
        for (field, value) in map {
            match value {
                serde_json::Value::String(s) => {
                    payload.fields.insert(field, s);
                }
                serde_json::Value::Number(n) => {
                    payload.fields.insert(field, n.to_string());
                }
                serde_json::Value::Bool(b) => {
                    payload.fields.insert(field, b.to_string());
                }
                serde_json::Value::Null => {}
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    tracing::debug!(field = %field, "skipping non-scalar payload field");
                }
            }
        }
        Ok(payload)
    }
}

impl From<HashMap<String, String>> for SecretPayload {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload").field("fields", &self.field_names()).finish()
    }
}

impl Drop for SecretPayload {
    fn drop(&mut self) {
        for (_, mut value) in self.fields.drain() {
            value.zeroize();
        }
    }
}
