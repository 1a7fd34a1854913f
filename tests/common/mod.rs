//! Common test utilities for all integration tests.
//!
//! Provides a scripted vault transport and configuration helpers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use envault::{
    ClientCredentials, EngineConfig, EnvaultError, Result, SecretPayload, VaultEndpoint,
    VaultSession, VaultTransport,
};

/// Calls observed by a [`ScriptedVault`], for asserting what the engine did.
#[derive(Debug, Default)]
pub struct CallLog {
    /// `(tenant, tld, client_id)` per authentication, in order.
    pub authentications: Vec<(String, String, String)>,
    /// Paths read, in order.
    pub reads: Vec<String>,
}

/// Scripted vault transport: seeded payloads, optional per-client denials,
/// optional artificial latency, and a call log.
#[derive(Default)]
pub struct ScriptedVault {
    secrets: HashMap<String, SecretPayload>,
    denied_client_ids: HashSet<String>,
    delay: Option<Duration>,
    pub calls: Mutex<CallLog>,
}

impl ScriptedVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the secret at `path` with the given fields.
    pub fn with_secret(mut self, path: &str, fields: &[(&str, &str)]) -> Self {
        let mut payload = SecretPayload::new();
        for (field, value) in fields {
            payload = payload.with_field(*field, *value);
        }
        self.secrets.insert(path.to_string(), payload);
        self
    }

    /// Makes authentication fail for `client_id`.
    pub fn deny_client(mut self, client_id: &str) -> Self {
        self.denied_client_ids.insert(client_id.to_string());
        self
    }

    /// Adds latency to every authentication.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn authentication_count(&self) -> usize {
        self.calls.lock().unwrap().authentications.len()
    }

    pub fn read_paths(&self) -> Vec<String> {
        self.calls.lock().unwrap().reads.clone()
    }
}

#[async_trait]
impl VaultTransport for ScriptedVault {
    async fn authenticate(
        &self,
        endpoint: &VaultEndpoint,
        credentials: &ClientCredentials,
    ) -> Result<VaultSession> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().authentications.push((
            endpoint.tenant().to_string(),
            endpoint.top_level_domain().to_string(),
            credentials.client_id.clone(),
        ));
        if self.denied_client_ids.contains(&credentials.client_id) {
            return Err(EnvaultError::authentication_failed(format!(
                "client '{}' rejected by tenant '{}'",
                credentials.client_id,
                endpoint.tenant()
            )));
        }
        Ok(VaultSession::new(endpoint.clone(), format!("token-for-{}", credentials.client_id)))
    }

    async fn read_secret(&self, _session: &VaultSession, path: &str) -> Result<SecretPayload> {
        self.calls.lock().unwrap().reads.push(path.to_string());
        self.secrets.get(path).cloned().ok_or_else(|| EnvaultError::secret_not_found(path))
    }
}

/// Engine configuration with a usable default tenant.
pub fn test_config() -> EngineConfig {
    EngineConfig { tenant: "acme".to_string(), ..EngineConfig::default() }
}
