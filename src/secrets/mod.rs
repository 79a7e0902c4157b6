//! Secret store abstraction and the fetcher built on top of it.
//!
//! The provider reads one secret through the [`SecretStore`] trait. Stores
//! return raw [`SecretResponse`]s; the [`SecretFetcher`] turns those into a
//! versioned [`SecretPayload`] or a typed
//! [`ProviderError`](crate::errors::ProviderError).
//!
//! # Supported Stores
//!
//! - **Environment Variables**: development store using the `SECRETS_CONFIG_SECRET_*` prefix
//! - **In-Memory**: versioned store with stage labels, for tests and demos
//! - **HashiCorp Vault**: KV v2 engine
//! - **AWS Secrets Manager**: behind the `aws` feature
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use secrets_config::secrets::{InMemorySecretStore, SecretFetcher, VersionSelector};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemorySecretStore::new());
//! let version = store.put_string("app/db", r#"{"Username":"app"}"#);
//!
//! let fetcher = SecretFetcher::new(store);
//! let payload = fetcher.get_secret("app/db", &VersionSelector::Latest).await.unwrap();
//! assert_eq!(payload.version_id, version);
//! # });
//! ```

use std::sync::Arc;

use tracing::info;

#[cfg(feature = "aws")]
pub mod aws;
pub mod client;
pub mod env;
pub mod error;
pub mod fetcher;
pub mod memory;
pub mod types;
pub mod vault;

#[cfg(feature = "aws")]
pub use aws::AwsSecretsManagerStore;
pub use client::SecretStore;
pub use env::{EnvVarSecretStore, DEFAULT_SECRET_PREFIX};
pub use error::{Result, SecretsError};
pub use fetcher::{content_version, SecretFetcher};
pub use memory::{InMemorySecretStore, STAGE_CURRENT, STAGE_PREVIOUS};
pub use types::{SecretPayload, SecretRequest, SecretResponse, SecretString, VersionSelector};
pub use vault::{VaultSecretStore, VaultStoreConfig};

use crate::config::{StoreBackend, StoreSettings};
use crate::errors::ProviderError;

/// Build the store selected by `settings`.
///
/// The Vault store falls back to `VAULT_ADDR`/`VAULT_TOKEN` style variables
/// when no address is configured.
pub async fn store_from_settings(
    settings: &StoreSettings,
) -> crate::errors::Result<Arc<dyn SecretStore>> {
    let store: Arc<dyn SecretStore> = match settings.backend {
        StoreBackend::Env => Arc::new(EnvVarSecretStore::with_prefix(settings.env_prefix.clone())),
        StoreBackend::Vault => {
            let config = match &settings.vault_address {
                Some(address) => VaultStoreConfig {
                    address: address.clone(),
                    token: settings.vault_token.clone(),
                    namespace: settings.vault_namespace.clone(),
                    kv_mount_path: settings.vault_kv_mount.clone(),
                },
                None => VaultStoreConfig::from_env().ok_or_else(|| {
                    ProviderError::config(
                        "store.vault_address (or VAULT_ADDR) is required for the vault backend",
                    )
                })?,
            };
            let store = VaultSecretStore::new(config).map_err(|e| {
                ProviderError::config_with_source("Failed to create Vault store", Box::new(e))
            })?;
            Arc::new(store)
        }
        #[cfg(feature = "aws")]
        StoreBackend::Aws => Arc::new(AwsSecretsManagerStore::new(settings.aws_region.clone()).await),
        #[cfg(not(feature = "aws"))]
        StoreBackend::Aws => {
            return Err(ProviderError::config(
                "the aws backend requires building with the `aws` feature",
            ))
        }
    };

    info!(backend = store.backend_name(), "Secret store configured");
    Ok(store)
}
