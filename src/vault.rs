//! Vault addressing, sessions, and the fetch client.
//!
//! The remote vault is opaque: the engine never speaks its wire protocol.
//! Hosts implement [`VaultTransport`] with whatever HTTP/SDK stack they
//! already carry; [`VaultClient`] drives it with one fresh session per fetch
//! and a per-fetch deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::credentials::ClientCredentials;
use crate::error::{EnvaultError, Result};
use crate::secret::{SecretPayload, SecretString};

/// Resolved vault addressing for one request: which tenant, under which
/// top-level domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEndpoint {
    tenant: String,
    top_level_domain: String,
}

impl VaultEndpoint {
    /// Builds an endpoint directly from non-blank parts.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when either part is blank.
    pub fn new(tenant: impl Into<String>, top_level_domain: impl Into<String>) -> Result<Self> {
        let tenant = tenant.into();
        let top_level_domain = top_level_domain.into();
        if tenant.trim().is_empty() {
            return Err(EnvaultError::configuration("vault tenant must not be blank"));
        }
        if top_level_domain.trim().is_empty() {
            return Err(EnvaultError::configuration("vault top-level domain must not be blank"));
        }
        Ok(Self { tenant, top_level_domain })
    }

    /// Reconciles per-request overrides with global defaults.
    ///
    /// A non-blank override wins; otherwise the configured default applies.
    /// Blank means empty or whitespace-only; the winning value is kept as
    /// written.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when tenant or top-level domain is still
    /// blank after defaulting.
    pub fn resolve(
        config: &EngineConfig,
        tenant_override: Option<&str>,
        tld_override: Option<&str>,
    ) -> Result<Self> {
        let tenant = effective_value(tenant_override, &config.tenant).ok_or_else(|| {
            EnvaultError::configuration("vault tenant is blank after applying defaults")
        })?;
        let top_level_domain = effective_value(tld_override, &config.top_level_domain)
            .ok_or_else(|| {
                EnvaultError::configuration("vault top-level domain is blank after applying defaults")
            })?;
        Ok(Self { tenant, top_level_domain })
    }

    /// Tenant this endpoint addresses.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Top-level domain of the vault service.
    pub fn top_level_domain(&self) -> &str {
        &self.top_level_domain
    }
}

fn effective_value(override_value: Option<&str>, default_value: &str) -> Option<String> {
    match override_value {
        Some(value) if !value.trim().is_empty() => Some(value.to_string()),
        _ if !default_value.trim().is_empty() => Some(default_value.to_string()),
        _ => None,
    }
}

/// An authenticated session produced by [`VaultTransport::authenticate`].
///
/// Carries whatever bearer material the vault issued. The engine threads it
/// into the read that follows and drops it with the request; sessions never
/// outlive the fetch that created them.
#[derive(Debug, Clone)]
pub struct VaultSession {
    endpoint: VaultEndpoint,
    token: SecretString,
}

impl VaultSession {
    /// Builds a session for `endpoint` holding `token`.
    pub fn new(endpoint: VaultEndpoint, token: impl Into<SecretString>) -> Self {
        Self { endpoint, token: token.into() }
    }

    /// Endpoint the session was established against.
    pub fn endpoint(&self) -> &VaultEndpoint {
        &self.endpoint
    }

    /// Bearer material for subsequent reads, redacted outside
    /// `expose_secret()`.
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

/// The opaque remote vault service.
///
/// Implementations exchange client credentials for a session and read secret
/// payloads by path. Failure mapping expected from implementations:
///
/// - rejected credentials → [`EnvaultError::AuthenticationFailed`]
/// - unknown path → [`EnvaultError::SecretNotFound`]
/// - connectivity trouble → [`EnvaultError::TransientNetwork`]
///
/// Error messages must never include secret material; identify requests by
/// tenant and path.
#[async_trait]
pub trait VaultTransport: Send + Sync {
    /// Exchanges client credentials for a session at `endpoint`.
    async fn authenticate(
        &self,
        endpoint: &VaultEndpoint,
        credentials: &ClientCredentials,
    ) -> Result<VaultSession>;

    /// Reads the secret stored at `path` using an established session.
    async fn read_secret(&self, session: &VaultSession, path: &str) -> Result<SecretPayload>;
}

/// Fetches secrets with one fresh session per call.
#[derive(Clone)]
pub struct VaultClient {
    transport: Arc<dyn VaultTransport>,
    fetch_timeout: Duration,
}

impl VaultClient {
    /// Wraps a transport with the per-fetch deadline.
    pub fn new(transport: Arc<dyn VaultTransport>, fetch_timeout: Duration) -> Self {
        Self { transport, fetch_timeout }
    }

    /// Authenticates and reads `path`, the whole exchange bounded by the
    /// per-fetch timeout.
    ///
    /// Sessions are never reused across calls, so a failing request cannot
    /// poison the next one.
    ///
    /// # Errors
    ///
    /// Everything the transport reports, plus [`EnvaultError::Timeout`] when
    /// the deadline expires first.
    pub async fn fetch_secret(
        &self,
        endpoint: &VaultEndpoint,
        credentials: &ClientCredentials,
        path: &str,
    ) -> Result<SecretPayload> {
        tracing::debug!(
            tenant = %endpoint.tenant(),
            tld = %endpoint.top_level_domain(),
            path = %path,
            "fetching secret"
        );

        let fetch = async {
            let session = self.transport.authenticate(endpoint, credentials).await?;
            self.transport.read_secret(&session, path).await
        };

        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(path = %path, timeout_ms = self.fetch_timeout.as_millis() as u64, "secret fetch timed out");
                Err(EnvaultError::timeout("vault secret fetch", self.fetch_timeout))
            }
        }
    }
}
