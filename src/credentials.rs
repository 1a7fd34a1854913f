//! Credential storage and resolution.
//!
//! The engine never owns credential material; it looks entries up by opaque
//! id through a host-supplied [`CredentialStore`] and only accepts
//! client-id/client-secret pairs for vault authentication.

use std::collections::HashMap;

use crate::error::{EnvaultError, Result};
use crate::secret::SecretString;

/// A client-id/client-secret pair used to authenticate against the vault.
///
/// Immutable once retrieved. Debug output shows the client id but never the
/// secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Public identifier presented during authentication.
    pub client_id: String,
    /// Matching secret, redacted everywhere except `expose_secret()`.
    pub client_secret: SecretString,
}

impl ClientCredentials {
    /// Builds a credential pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecretString>) -> Self {
        Self { client_id: client_id.into(), client_secret: client_secret.into() }
    }
}

/// An entry held by a credential store.
#[derive(Debug, Clone)]
pub enum StoredCredential {
    /// A pair usable for vault authentication.
    Client(ClientCredentials),
    /// Anything else the store may hold under an id (ssh keys, certificates).
    /// `kind` names the entry type for error reporting.
    Other { kind: String },
}

/// Host-supplied lookup of credential entries by opaque id.
///
/// The engine only ever reads. How entries are stored, scoped, or rotated is
/// entirely the host's business.
pub trait CredentialStore: Send + Sync {
    /// Returns the entry stored under `id`, if any.
    fn find(&self, id: &str) -> Option<StoredCredential>;
}

/// Resolves `id` to a client pair usable for vault authentication.
///
/// # Errors
///
/// - [`EnvaultError::CredentialNotFound`] when no entry exists under `id`.
/// - [`EnvaultError::CredentialTypeMismatch`] when the entry is not a
///   client-id/client-secret pair.
pub fn resolve(store: &dyn CredentialStore, id: &str) -> Result<ClientCredentials> {
    match store.find(id) {
        Some(StoredCredential::Client(credentials)) => {
            tracing::debug!(credential_id = %id, client_id = %credentials.client_id, "resolved client credential");
            Ok(credentials)
        }
        Some(StoredCredential::Other { kind }) => {
            Err(EnvaultError::credential_type_mismatch(id, kind))
        }
        None => Err(EnvaultError::credential_not_found(id)),
    }
}

/// In-memory credential store for embedders and tests.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: HashMap<String, StoredCredential>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a client-id/client-secret pair under `id`.
    pub fn with_client(
        mut self,
        id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Self {
        self.entries
            .insert(id.into(), StoredCredential::Client(ClientCredentials::new(client_id, client_secret)));
        self
    }

    /// Adds an arbitrary entry under `id`.
    pub fn with_entry(mut self, id: impl Into<String>, entry: StoredCredential) -> Self {
        self.entries.insert(id.into(), entry);
        self
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn find(&self, id: &str) -> Option<StoredCredential> {
        self.entries.get(id).cloned()
    }
}

/// Prefix for [`EnvCredentialStore`] variables.
const ENV_CREDENTIAL_PREFIX: &str = "ENVAULT_CREDENTIAL_";

/// Credential store backed by process environment variables.
///
/// For an id `deploy-bot` this store reads
/// `ENVAULT_CREDENTIAL_DEPLOY_BOT_CLIENT_ID` and
/// `ENVAULT_CREDENTIAL_DEPLOY_BOT_CLIENT_SECRET`; ids are uppercased and
/// non-alphanumeric characters become underscores. An id resolves only when
/// both variables are present.
///
/// Intended for development and CI bootstrap. Production hosts should back
/// [`CredentialStore`] with their own credential manager.
#[derive(Debug, Default)]
pub struct EnvCredentialStore;

impl EnvCredentialStore {
    /// Creates the store.
    pub fn new() -> Self {
        Self
    }

    fn env_key(id: &str, suffix: &str) -> String {
        let normalized: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}_{}", ENV_CREDENTIAL_PREFIX, normalized, suffix)
    }
}

impl CredentialStore for EnvCredentialStore {
    fn find(&self, id: &str) -> Option<StoredCredential> {
        let client_id = std::env::var(Self::env_key(id, "CLIENT_ID")).ok()?;
        let client_secret = std::env::var(Self::env_key(id, "CLIENT_SECRET")).ok()?;
        Some(StoredCredential::Client(ClientCredentials::new(client_id, client_secret)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_returns_client_pair() {
        let store = InMemoryCredentialStore::new().with_client("c1", "client-id", "client-secret");

        let credentials = resolve(&store, "c1").unwrap();
        assert_eq!(credentials.client_id, "client-id");
        assert_eq!(credentials.client_secret.expose_secret(), "client-secret");
    }

    #[test]
    fn test_resolve_unknown_id_fails() {
        let store = InMemoryCredentialStore::new();

        let err = resolve(&store, "nope").unwrap_err();
        assert!(matches!(err, EnvaultError::CredentialNotFound { id } if id == "nope"));
    }

    #[test]
    fn test_resolve_rejects_other_entry_kinds() {
        let store = InMemoryCredentialStore::new()
            .with_entry("key1", StoredCredential::Other { kind: "ssh key".to_string() });

        let err = resolve(&store, "key1").unwrap_err();
        assert!(matches!(err, EnvaultError::CredentialTypeMismatch { .. }));
        assert!(err.to_string().contains("ssh key"));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = ClientCredentials::new("client-id", "client-secret");
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("client-id"));
        assert!(!debug.contains("client-secret"));
    }

    #[test]
    fn test_env_store_key_normalization() {
        assert_eq!(
            EnvCredentialStore::env_key("deploy-bot", "CLIENT_ID"),
            "ENVAULT_CREDENTIAL_DEPLOY_BOT_CLIENT_ID"
        );
        assert_eq!(
            EnvCredentialStore::env_key("ci.job 7", "CLIENT_SECRET"),
            "ENVAULT_CREDENTIAL_CI_JOB_7_CLIENT_SECRET"
        );
    }

    #[test]
    fn test_env_store_requires_both_variables() {
        // Variable names are unique to this test, so no other test can race it.
        std::env::set_var("ENVAULT_CREDENTIAL_HALFSET_CLIENT_ID", "only-id");
        let store = EnvCredentialStore::new();

        assert!(store.find("halfset").is_none());

        std::env::set_var("ENVAULT_CREDENTIAL_HALFSET_CLIENT_SECRET", "now-complete");
        let found = store.find("halfset");
        assert!(matches!(found, Some(StoredCredential::Client(_))));

        std::env::remove_var("ENVAULT_CREDENTIAL_HALFSET_CLIENT_ID");
        std::env::remove_var("ENVAULT_CREDENTIAL_HALFSET_CLIENT_SECRET");
    }
}
