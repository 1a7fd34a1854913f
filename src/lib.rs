//! # Envault
//!
//! Envault is a secret-resolution and environment-injection engine with
//! output redaction. Given a declarative list of secret requests it
//! authenticates against a remote vault per request, fetches structured
//! payloads, maps selected fields into named environment variables, and
//! guarantees the fetched values never appear unmasked in output routed
//! through its writer.
//!
//! ## Architecture
//!
//! The host supplies the collaborators; the engine supplies the run:
//!
//! ```text
//! [SecretRequest, ...] → Injector → CredentialStore (host lookup by id)
//!                                 → VaultTransport  (host wire protocol)
//!                                 → EnvironmentSink (host env map)
//!                        MaskedValues → MaskingWriter (wraps host output)
//! ```
//!
//! ## Core Components
//!
//! - **Injector**: sequential orchestration loop, fail-fast by default
//! - **VaultClient**: one fresh session per fetch, bounded by a per-fetch timeout
//! - **Mapping**: payload fields onto prefixed environment names
//! - **Redaction**: lazily rebuilt aggregate matcher replacing values with `****`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use envault::{EngineConfig, Injector, InMemoryCredentialStore, SecretRequest, VaultTransport};
//!
//! # async fn example(transport: Arc<dyn VaultTransport>) -> envault::Result<()> {
//! let config = EngineConfig { tenant: "acme".into(), env_prefix: "VAULT_".into(), ..Default::default() };
//! let store = InMemoryCredentialStore::new().with_client("ci-bot", "client-id", "client-secret");
//! let injector = Injector::new(config, Arc::new(store), transport);
//!
//! let requests = vec![SecretRequest::new("db", "ci-bot").with_mapping("password", "DB_PASS")];
//! let mut env: HashMap<String, String> = HashMap::new();
//! let report = injector.run(&requests, &mut env).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod injector;
pub mod mapping;
pub mod redaction;
pub mod secret;
pub mod vault;

// Re-export commonly used types and traits
pub use config::EngineConfig;
pub use credentials::{
    ClientCredentials, CredentialStore, EnvCredentialStore, InMemoryCredentialStore,
    StoredCredential,
};
pub use env::EnvironmentSink;
pub use error::{EnvaultError, Result};
pub use injector::{ErrorPolicy, Injector, RequestFailure, RunReport, SecretRequest};
pub use mapping::{EnvAssignment, FieldMapping, MissingFieldPolicy};
pub use redaction::{MaskedValues, MaskingWriter, MASK};
pub use secret::{SecretPayload, SecretString};
pub use vault::{VaultClient, VaultEndpoint, VaultSession, VaultTransport};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "envault");
    }
}
