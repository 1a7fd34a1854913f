//! The injection run: resolve, fetch, map, export.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use crate::config::EngineConfig;
use crate::credentials::{self, CredentialStore};
use crate::env::EnvironmentSink;
use crate::error::{EnvaultError, Result};
use crate::mapping::{self, EnvAssignment, FieldMapping};
use crate::redaction::{MaskedValues, MaskingWriter};
use crate::vault::{VaultClient, VaultEndpoint, VaultTransport};

/// One declarative secret fetch: which secret, authenticated how, mapped
/// where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SecretRequest {
    /// Vault path of the secret to fetch.
    #[validate(length(min = 1, message = "path must not be empty"))]
    pub path: String,

    /// Opaque id resolved through the host's
    /// [`CredentialStore`](crate::CredentialStore).
    #[validate(length(min = 1, message = "credential_id must not be empty"))]
    pub credential_id: String,

    /// Per-request tenant override; blank falls back to the global default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,

    /// Per-request top-level-domain override; blank falls back to the global
    /// default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tld: Option<String>,

    /// Field-to-variable mappings applied to the fetched payload.
    #[serde(default)]
    #[validate(nested)]
    pub mappings: Vec<FieldMapping>,
}

impl SecretRequest {
    /// Starts a request for the secret at `path`, authenticated via
    /// `credential_id`.
    pub fn new(path: impl Into<String>, credential_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            credential_id: credential_id.into(),
            tenant: None,
            tld: None,
            mappings: Vec::new(),
        }
    }

    /// Overrides the vault tenant for this request.
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Overrides the vault top-level domain for this request.
    pub fn with_tld(mut self, tld: impl Into<String>) -> Self {
        self.tld = Some(tld.into());
        self
    }

    /// Appends a field-to-variable mapping.
    pub fn with_mapping(mut self, data_field: impl Into<String>, env_var: impl Into<String>) -> Self {
        self.mappings.push(FieldMapping::new(data_field, env_var));
        self
    }
}

/// Whether a failing request aborts the run or is recorded and skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// The first failure aborts the run; requests after it never execute.
    /// Writes already applied stay applied.
    #[default]
    FailFast,
    /// Record the failure in the report and keep going.
    ContinueOnError,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => write!(f, "fail_fast"),
            Self::ContinueOnError => write!(f, "continue_on_error"),
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = EnvaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fail_fast" => Ok(Self::FailFast),
            "continue_on_error" => Ok(Self::ContinueOnError),
            other => Err(EnvaultError::configuration(format!(
                "unknown error policy '{}', expected fail_fast or continue_on_error",
                other
            ))),
        }
    }
}

/// A request that failed during a [`ErrorPolicy::ContinueOnError`] run.
#[derive(Debug)]
pub struct RequestFailure {
    /// Position of the request in the submitted list.
    pub index: usize,
    /// Vault path the request addressed.
    pub path: String,
    /// What went wrong.
    pub error: EnvaultError,
}

/// Outcome of [`Injector::run`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Requests that completed all of their writes.
    pub requests_completed: usize,
    /// Environment variables exported across all requests.
    pub variables_exported: usize,
    /// Failures recorded under [`ErrorPolicy::ContinueOnError`].
    pub failures: Vec<RequestFailure>,
}

impl RunReport {
    /// True when every request completed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives whole runs: each request is validated, resolved against the
/// credential store, fetched through the vault transport, mapped, and
/// exported, strictly in declaration order.
///
/// The injector owns the run's [`MaskedValues`]; wrap the host's console
/// stream via [`Injector::masking_writer`] before running and every fetched
/// value is masked from the moment it is mapped.
pub struct Injector {
    config: EngineConfig,
    store: Arc<dyn CredentialStore>,
    vault: VaultClient,
    masked: MaskedValues,
}

impl Injector {
    /// Builds an injector from global defaults and the host's collaborators.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn VaultTransport>,
    ) -> Self {
        let vault = VaultClient::new(transport, config.fetch_timeout());
        Self { config, store, vault, masked: MaskedValues::new() }
    }

    /// Global defaults this injector runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle to the values masked so far.
    pub fn masked_values(&self) -> MaskedValues {
        self.masked.clone()
    }

    /// Wraps a host output stream so registered values never appear in it.
    pub fn masking_writer<W: Write>(&self, inner: W) -> MaskingWriter<W> {
        MaskingWriter::new(inner, self.masked.clone())
    }

    /// Processes `requests` in order, exporting resolved variables into
    /// `env`.
    ///
    /// Under [`ErrorPolicy::FailFast`] the first failure is returned as the
    /// error and later requests never run; writes already applied are not
    /// rolled back. Under [`ErrorPolicy::ContinueOnError`] failures land in
    /// the report instead.
    pub async fn run(
        &self,
        requests: &[SecretRequest],
        env: &mut dyn EnvironmentSink,
    ) -> Result<RunReport> {
        let span = tracing::info_span!(
            "secret_injection",
            run_id = %Uuid::new_v4(),
            requests = requests.len()
        );
        self.run_all(requests, env).instrument(span).await
    }

    async fn run_all(
        &self,
        requests: &[SecretRequest],
        env: &mut dyn EnvironmentSink,
    ) -> Result<RunReport> {
        let mut report = RunReport::default();

        for (index, request) in requests.iter().enumerate() {
            match self.process(request).await {
                Ok(assignments) => {
                    for assignment in &assignments {
                        env.export(&assignment.name, &assignment.value);
                    }
                    report.requests_completed += 1;
                    report.variables_exported += assignments.len();
                    tracing::info!(
                        path = %request.path,
                        exported = assignments.len(),
                        "request completed"
                    );
                }
                Err(error) => {
                    tracing::error!(path = %request.path, index, error = %error, "request failed");
                    match self.config.on_error {
                        ErrorPolicy::FailFast => return Err(error),
                        ErrorPolicy::ContinueOnError => {
                            report.failures.push(RequestFailure {
                                index,
                                path: request.path.clone(),
                                error,
                            });
                        }
                    }
                }
            }
        }

        tracing::info!(
            completed = report.requests_completed,
            exported = report.variables_exported,
            failed = report.failures.len(),
            "injection run finished"
        );
        Ok(report)
    }

    async fn process(&self, request: &SecretRequest) -> Result<Vec<EnvAssignment>> {
        request.validate()?;

        let endpoint =
            VaultEndpoint::resolve(&self.config, request.tenant.as_deref(), request.tld.as_deref())?;
        let credentials = credentials::resolve(self.store.as_ref(), &request.credential_id)?;
        let payload = self.vault.fetch_secret(&endpoint, &credentials, &request.path).await?;

        // Mask registration happens inside apply_mappings, before any caller
        // can observe the assignments.
        mapping::apply_mappings(
            &payload,
            &request.mappings,
            &self.config.env_prefix,
            self.config.missing_field,
            &self.masked,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = SecretRequest::new("db", "c1")
            .with_tenant("acme")
            .with_tld("eu")
            .with_mapping("password", "DB_PASS");

        assert_eq!(request.path, "db");
        assert_eq!(request.credential_id, "c1");
        assert_eq!(request.tenant.as_deref(), Some("acme"));
        assert_eq!(request.tld.as_deref(), Some("eu"));
        assert_eq!(request.mappings, vec![FieldMapping::new("password", "DB_PASS")]);
    }

    #[test]
    fn test_request_deserializes_from_declarative_form() {
        let json = r#"
            [
                {
                    "path": "db",
                    "credential_id": "c1",
                    "mappings": [
                        {"data_field": "password", "env_var": "DB_PASS"}
                    ]
                },
                {
                    "path": "api",
                    "credential_id": "c2",
                    "tenant": "other"
                }
            ]
        "#;

        let requests: Vec<SecretRequest> = serde_json::from_str(json).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].mappings.len(), 1);
        assert_eq!(requests[1].tenant.as_deref(), Some("other"));
        assert!(requests[1].mappings.is_empty());
    }

    #[test]
    fn test_request_validation() {
        assert!(SecretRequest::new("db", "c1").validate().is_ok());
        assert!(SecretRequest::new("", "c1").validate().is_err());
        assert!(SecretRequest::new("db", "").validate().is_err());
        assert!(SecretRequest::new("db", "c1").with_mapping("", "X").validate().is_err());
    }

    #[test]
    fn test_error_policy_parse_and_display() {
        assert_eq!("fail_fast".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::FailFast);
        assert_eq!(
            "continue_on_error".parse::<ErrorPolicy>().unwrap(),
            ErrorPolicy::ContinueOnError
        );
        assert_eq!(ErrorPolicy::FailFast.to_string(), "fail_fast");
        assert!("ignore".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_report_success() {
        let mut report = RunReport::default();
        assert!(report.is_success());

        report.failures.push(RequestFailure {
            index: 0,
            path: "db".to_string(),
            error: EnvaultError::secret_not_found("db"),
        });
        assert!(!report.is_success());
    }
}
