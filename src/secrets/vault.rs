//! HashiCorp Vault secret store (KV v2 engine).
//!
//! A secret id is a path inside the KV mount. The data object stored at that
//! path becomes the secret document, so
//!
//! ```bash
//! vault kv put secret/app/db Username=app Password=s3cret
//! ```
//!
//! yields `{"Username":"app","Password":"s3cret"}`. The KV version number is
//! the version id: `VersionSelector::Id("3")` reads version 3, stages are not
//! supported.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::SecretStore;
use super::error::{Result, SecretsError};
use super::types::{SecretRequest, SecretResponse, SecretString, VersionSelector};

/// Configuration for the Vault store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultStoreConfig {
    /// Vault server address
    pub address: String,
    /// Vault authentication token
    pub token: Option<SecretString>,
    /// Vault namespace (for Enterprise)
    pub namespace: Option<String>,
    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_kv_mount")]
    pub kv_mount_path: String,
}

pub(crate) fn default_kv_mount() -> String {
    "secret".to_string()
}

impl VaultStoreConfig {
    /// Load configuration from environment variables
    ///
    /// Uses:
    /// - `SECRETS_CONFIG_VAULT_ADDR` or `VAULT_ADDR`
    /// - `SECRETS_CONFIG_VAULT_TOKEN` or `VAULT_TOKEN`
    /// - `SECRETS_CONFIG_VAULT_NAMESPACE` or `VAULT_NAMESPACE`
    /// - `SECRETS_CONFIG_VAULT_KV_MOUNT` (default: "secret")
    ///
    /// Returns `None` when no address is set.
    pub fn from_env() -> Option<Self> {
        let address = std::env::var("SECRETS_CONFIG_VAULT_ADDR")
            .or_else(|_| std::env::var("VAULT_ADDR"))
            .ok()?;

        let token = std::env::var("SECRETS_CONFIG_VAULT_TOKEN")
            .or_else(|_| std::env::var("VAULT_TOKEN"))
            .ok()
            .map(SecretString::new);

        let namespace = std::env::var("SECRETS_CONFIG_VAULT_NAMESPACE")
            .or_else(|_| std::env::var("VAULT_NAMESPACE"))
            .ok();

        let kv_mount_path =
            std::env::var("SECRETS_CONFIG_VAULT_KV_MOUNT").unwrap_or_else(|_| default_kv_mount());

        Some(Self { address, token, namespace, kv_mount_path })
    }
}

/// HashiCorp Vault KV v2 secret store
pub struct VaultSecretStore {
    client: VaultClient,
    kv_mount_path: String,
}

impl std::fmt::Debug for VaultSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSecretStore")
            .field("kv_mount_path", &self.kv_mount_path)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultSecretStore {
    /// Create a new Vault store with the given configuration
    pub fn new(config: VaultStoreConfig) -> Result<Self> {
        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token.expose_secret());
        }

        if let Some(ref namespace) = config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault store configuration: {}", e))
        })?;

        let client = VaultClient::new(settings)
            .map_err(|e| SecretsError::config_error(format!("Failed to create Vault client: {}", e)))?;

        info!(address = %config.address, kv_mount = %config.kv_mount_path, "Initialized Vault secret store");

        Ok(Self { client, kv_mount_path: config.kv_mount_path })
    }

    /// Create a store from environment configuration
    pub fn from_env() -> Result<Option<Self>> {
        VaultStoreConfig::from_env().map(Self::new).transpose()
    }

    async fn resolve_version(&self, request: &SecretRequest) -> Result<u64> {
        match &request.version {
            VersionSelector::Latest => {
                let metadata = kv2::read_metadata(&self.client, &self.kv_mount_path, &request.secret_id)
                    .await
                    .map_err(|e| map_client_error(&request.secret_id, e))?;
                Ok(metadata.current_version)
            }
            VersionSelector::Id(id) => id.parse::<u64>().map_err(|_| {
                SecretsError::invalid_key(
                    &request.secret_id,
                    format!("Vault KV versions are numbers, got '{}'", id),
                )
            }),
            VersionSelector::Stage(stage) => Err(SecretsError::unsupported(
                "vault",
                format!("version stage '{}' requested for '{}'", stage, request.secret_id),
            )),
        }
    }
}

fn map_client_error(path: &str, error: ClientError) -> SecretsError {
    match error {
        ClientError::APIError { code: 404, .. } => SecretsError::not_found(path),
        ClientError::APIError { code: 401 | 403, ref errors } => {
            SecretsError::authentication_failed(format!("access to '{}' denied: {}", path, errors.join(", ")))
        }
        other => SecretsError::backend_with_source(format!("Vault request for '{}' failed", path), other),
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    fn backend_name(&self) -> &'static str {
        "vault"
    }

    async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse> {
        debug!(
            secret_name = %request.secret_id,
            version = %request.version,
            kv_mount = %self.kv_mount_path,
            "Fetching secret from Vault"
        );

        let version = self.resolve_version(request).await?;

        let data: serde_json::Value =
            kv2::read_version(&self.client, &self.kv_mount_path, &request.secret_id, version)
                .await
                .map_err(|e| {
                    error!(secret_name = %request.secret_id, version, error = %e, "Failed to read secret from Vault");
                    map_client_error(&request.secret_id, e)
                })?;

        let text = serde_json::to_string(&data).map_err(|e| {
            SecretsError::backend_with_source(
                format!("Vault data for '{}' cannot be serialized", request.secret_id),
                e,
            )
        })?;

        Ok(SecretResponse::text(Some(version.to_string()), text))
    }
}
