//! Secret fetcher: one store call, normalised into a [`SecretPayload`] or a
//! typed [`ProviderError`].

use std::sync::Arc;

use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::client::SecretStore;
use super::error::SecretsError;
use super::types::{SecretPayload, SecretRequest, SecretResponse, SecretString, VersionSelector};
use crate::errors::{ProviderError, Result};

/// Wraps a [`SecretStore`] and maps its responses for the provider.
#[derive(Clone)]
pub struct SecretFetcher {
    store: Arc<dyn SecretStore>,
}

impl std::fmt::Debug for SecretFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretFetcher").field("store", &self.store.backend_name()).finish()
    }
}

impl SecretFetcher {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Fetch `secret_id` at `version` and return its text and version id.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::NotFound`] when the store does not know the secret
    /// - [`ProviderError::Retrieval`] for every other store failure and for
    ///   responses carrying no usable payload
    pub async fn get_secret(
        &self,
        secret_id: &str,
        version: &VersionSelector,
    ) -> Result<SecretPayload> {
        let request = SecretRequest::new(secret_id, version.clone());
        debug!(
            secret_name = %secret_id,
            version = %version,
            backend = self.store.backend_name(),
            "Fetching secret"
        );

        let response =
            self.store.get_secret_value(&request).await.map_err(|e| self.map_store_error(secret_id, e))?;

        Self::payload_from_response(secret_id, response)
    }

    fn map_store_error(&self, secret_id: &str, error: SecretsError) -> ProviderError {
        if error.is_not_found() {
            ProviderError::not_found_with_source(secret_id, Box::new(error))
        } else {
            ProviderError::retrieval_with_source(
                format!(
                    "Failed to retrieve secret {} from {} store",
                    secret_id,
                    self.store.backend_name()
                ),
                Box::new(error),
            )
        }
    }

    fn payload_from_response(secret_id: &str, response: SecretResponse) -> Result<SecretPayload> {
        let SecretResponse { version_id, secret_string, secret_binary } = response;

        let value = match (secret_string, secret_binary) {
            (Some(text), _) => text,
            (None, Some(bytes)) => decode_binary(secret_id, &bytes)?,
            (None, None) => {
                return Err(ProviderError::retrieval(format!(
                    "Secret {} is neither string nor binary",
                    secret_id
                )))
            }
        };

        let version_id = version_id.unwrap_or_else(|| content_version(value.expose_secret()));
        Ok(SecretPayload { version_id, value })
    }
}

/// Binary secrets hold base64 text of a UTF-8 document.
fn decode_binary(secret_id: &str, bytes: &[u8]) -> Result<SecretString> {
    let encoded = std::str::from_utf8(bytes).map_err(|e| {
        ProviderError::retrieval_with_source(
            format!("Binary secret {} is not base64 text", secret_id),
            Box::new(e),
        )
    })?;

    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded.trim()).map_err(|e| {
        ProviderError::retrieval_with_source(
            format!("Binary secret {} is not valid base64", secret_id),
            Box::new(e),
        )
    })?;

    String::from_utf8(decoded).map(SecretString::new).map_err(|e| {
        ProviderError::retrieval_with_source(
            format!("Binary secret {} does not decode to UTF-8 text", secret_id),
            Box::new(e),
        )
    })
}

/// Version id for stores that do not track versions: SHA-256 of the text, hex encoded.
pub fn content_version(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
