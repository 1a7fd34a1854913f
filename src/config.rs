//! Global engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EnvaultError, Result};
use crate::injector::ErrorPolicy;
use crate::mapping::MissingFieldPolicy;

/// Immutable global defaults for a run.
///
/// Built once by the host and handed to the [`Injector`](crate::Injector);
/// nothing in the engine mutates it afterwards. Per-request overrides beat
/// `tenant` and `top_level_domain` when non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default vault tenant. May stay blank when every request overrides it.
    #[serde(default)]
    pub tenant: String,

    /// Default top-level domain of the vault service.
    #[serde(default = "default_top_level_domain")]
    pub top_level_domain: String,

    /// Prefix prepended (surrounding whitespace trimmed) to every exported
    /// variable name.
    #[serde(default)]
    pub env_prefix: String,

    /// Upper bound for a single secret fetch, in seconds. Covers the
    /// authentication exchange and the read together.
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,

    /// What to do when a mapped data field is absent from the payload.
    #[serde(default)]
    pub missing_field: MissingFieldPolicy,

    /// Whether a failing request aborts the run or is recorded and skipped.
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

fn default_top_level_domain() -> String {
    "com".to_string()
}

fn default_fetch_timeout_seconds() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            top_level_domain: default_top_level_domain(),
            env_prefix: String::new(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
            missing_field: MissingFieldPolicy::default(),
            on_error: ErrorPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from `ENVAULT_*` environment variables, keeping
    /// defaults for anything unset.
    ///
    /// Recognized variables: `ENVAULT_TENANT`, `ENVAULT_TLD`,
    /// `ENVAULT_ENV_PREFIX`, `ENVAULT_FETCH_TIMEOUT_SECONDS`,
    /// `ENVAULT_MISSING_FIELD` (`write_empty`/`skip`/`fail`) and
    /// `ENVAULT_ON_ERROR` (`fail_fast`/`continue_on_error`).
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a set variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(tenant) = std::env::var("ENVAULT_TENANT") {
            config.tenant = tenant;
        }
        if let Ok(tld) = std::env::var("ENVAULT_TLD") {
            config.top_level_domain = tld;
        }
        if let Ok(prefix) = std::env::var("ENVAULT_ENV_PREFIX") {
            config.env_prefix = prefix;
        }
        if let Ok(value) = std::env::var("ENVAULT_FETCH_TIMEOUT_SECONDS") {
            config.fetch_timeout_seconds = value.parse().map_err(|_| {
                EnvaultError::configuration(format!(
                    "invalid ENVAULT_FETCH_TIMEOUT_SECONDS value '{}', expected seconds",
                    value
                ))
            })?;
        }
        if let Ok(value) = std::env::var("ENVAULT_MISSING_FIELD") {
            config.missing_field = value.parse()?;
        }
        if let Ok(value) = std::env::var("ENVAULT_ON_ERROR") {
            config.on_error = value.parse()?;
        }

        tracing::debug!(
            tld = %config.top_level_domain,
            fetch_timeout_seconds = config.fetch_timeout_seconds,
            "loaded engine configuration from environment"
        );
        Ok(config)
    }

    /// Per-fetch deadline as a [`Duration`].
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}
