//! Error types for secret resolution and injection.

use std::time::Duration;

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EnvaultError>;

/// Errors that can occur while resolving credentials, fetching secrets,
/// or mapping them into the environment.
///
/// Error messages identify requests by path and credentials by id.
/// Secret values never appear in any variant.
#[derive(Error, Debug)]
pub enum EnvaultError {
    /// No entry exists in the credential store under the requested id.
    #[error("Credential not found: {id}")]
    CredentialNotFound { id: String },

    /// The store holds an entry under the id, but it is not a
    /// client-id/client-secret pair.
    #[error("Credential '{id}' is not a client credential (found {found})")]
    CredentialTypeMismatch { id: String, found: String },

    /// The vault rejected the presented credentials.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// No secret exists at the requested path.
    #[error("Secret not found: {path}")]
    SecretNotFound { path: String },

    /// Transport-level failure reaching the vault.
    #[error("Transient network error: {message}")]
    TransientNetwork { message: String },

    /// An operation exceeded its configured deadline.
    #[error("Timed out after {duration_ms}ms during {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    /// A required setting is blank or malformed after defaulting.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The fetched payload has no value under a mapped data field.
    #[error("Data field not found: {field}")]
    FieldNotFound { field: String },
}

impl EnvaultError {
    /// Create a credential not found error.
    pub fn credential_not_found(id: impl Into<String>) -> Self {
        Self::CredentialNotFound { id: id.into() }
    }

    /// Create a credential type mismatch error.
    pub fn credential_type_mismatch(id: impl Into<String>, found: impl Into<String>) -> Self {
        Self::CredentialTypeMismatch { id: id.into(), found: found.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a secret not found error.
    pub fn secret_not_found(path: impl Into<String>) -> Self {
        Self::SecretNotFound { path: path.into() }
    }

    /// Create a transient network error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientNetwork { message: message.into() }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms: duration.as_millis() as u64 }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a field not found error.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound { field: field.into() }
    }

    /// Whether retrying the same operation could plausibly succeed.
    ///
    /// The engine itself never retries; hosts may use this to decide.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork { .. } | Self::Timeout { .. })
    }
}

impl From<validator::ValidationErrors> for EnvaultError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Configuration { message: format!("request validation failed: {}", err) }
    }
}
