//! AWS Secrets Manager secret store (feature `aws`).

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::Client;
use tracing::{debug, info};

use super::client::SecretStore;
use super::error::{Result, SecretsError};
use super::types::{SecretRequest, SecretResponse, VersionSelector};

/// Reads secrets with `GetSecretValue`.
///
/// Credentials come from the default AWS provider chain. Version ids and
/// stages map directly onto the `VersionId` and `VersionStage` parameters.
#[derive(Clone)]
pub struct AwsSecretsManagerStore {
    client: Client,
}

impl std::fmt::Debug for AwsSecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerStore").field("client", &"[Client]").finish()
    }
}

impl AwsSecretsManagerStore {
    /// Build a client from the default config chain, optionally pinned to `region`.
    pub async fn new(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region.clone() {
            loader = loader.region(Region::new(region));
        }

        let sdk_config = loader.load().await;
        info!(region = ?sdk_config.region(), "Initialized AWS Secrets Manager store");

        Self { client: Client::new(&sdk_config) }
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    fn backend_name(&self) -> &'static str {
        "aws"
    }

    async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse> {
        debug!(secret_name = %request.secret_id, version = %request.version, "Fetching secret from AWS Secrets Manager");

        let mut call = self.client.get_secret_value().secret_id(&request.secret_id);
        call = match &request.version {
            VersionSelector::Latest => call,
            VersionSelector::Id(id) => call.version_id(id),
            VersionSelector::Stage(stage) => call.version_stage(stage),
        };

        let output = call.send().await.map_err(|e| {
            let not_found = e
                .as_service_error()
                .map(|service_error| service_error.is_resource_not_found_exception())
                .unwrap_or(false);
            if not_found {
                SecretsError::not_found(&request.secret_id)
            } else {
                SecretsError::backend_with_source(
                    format!("GetSecretValue for '{}' failed", request.secret_id),
                    e,
                )
            }
        })?;

        let version_id = output.version_id().map(str::to_string);
        Ok(match (output.secret_string(), output.secret_binary()) {
            (Some(text), _) => SecretResponse::text(version_id, text),
            (None, Some(blob)) => SecretResponse::binary(version_id, blob.as_ref().to_vec()),
            (None, None) => SecretResponse { version_id, ..SecretResponse::default() },
        })
    }
}
