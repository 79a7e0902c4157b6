//! Environment variable secret store.
//!
//! Intended for **development and testing only**. Environment variables are
//! visible in process listings, have no encryption at rest and no versioning.
//! Use HashiCorp Vault or AWS Secrets Manager in production.
//!
//! # Usage
//!
//! Secret `app/db-credentials` is read from
//! `SECRETS_CONFIG_SECRET_APP_DB_CREDENTIALS`:
//!
//! ```bash
//! export SECRETS_CONFIG_SECRET_APP_DB_CREDENTIALS='{"Username":"app","Password":"dev"}'
//! ```
//!
//! The store reports no version id, so the fetcher derives one from the
//! content; a changed variable is picked up by the next refresh.

use async_trait::async_trait;
use std::env;

use super::client::SecretStore;
use super::error::{Result, SecretsError};
use super::types::{SecretRequest, SecretResponse, VersionSelector};

/// Default environment variable prefix for secrets.
pub const DEFAULT_SECRET_PREFIX: &str = "SECRETS_CONFIG_SECRET_";

/// Reads secrets from prefixed environment variables (development only).
#[derive(Debug, Clone)]
pub struct EnvVarSecretStore {
    prefix: String,
}

impl Default for EnvVarSecretStore {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_SECRET_PREFIX)
    }
}

impl EnvVarSecretStore {
    /// Creates a store using [`DEFAULT_SECRET_PREFIX`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Converts a secret id to its environment variable name: uppercased,
    /// every character other than ASCII letters and digits replaced by `_`.
    ///
    /// ```rust
    /// use secrets_config::secrets::EnvVarSecretStore;
    ///
    /// let store = EnvVarSecretStore::new();
    /// assert_eq!(store.env_var_name("app/db-credentials"), "SECRETS_CONFIG_SECRET_APP_DB_CREDENTIALS");
    /// ```
    pub fn env_var_name(&self, secret_id: &str) -> String {
        let suffix: String = secret_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

#[async_trait]
impl SecretStore for EnvVarSecretStore {
    fn backend_name(&self) -> &'static str {
        "env"
    }

    async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse> {
        if request.version != VersionSelector::Latest {
            return Err(SecretsError::unsupported(
                "env",
                format!("cannot select version {} of '{}'", request.version, request.secret_id),
            ));
        }

        let env_var = self.env_var_name(&request.secret_id);
        env::var(&env_var).map(|value| SecretResponse::text(None, value)).map_err(|_| {
            SecretsError::not_found(format!(
                "Secret '{}' not found in environment (looking for {})",
                request.secret_id, env_var
            ))
        })
    }
}
