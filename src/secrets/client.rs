//! Core secret store trait.

use async_trait::async_trait;

use super::error::Result;
use super::types::{SecretRequest, SecretResponse};

/// Read access to a versioned secret store.
///
/// The provider only ever reads: one call per load or refresh, no caching and
/// no retries. Anything smarter belongs in the store implementation.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values
/// - Network communication MUST use TLS
///
/// # Example Implementation
///
/// ```rust
/// use async_trait::async_trait;
/// use secrets_config::secrets::{Result, SecretRequest, SecretResponse, SecretStore, SecretsError};
///
/// struct StaticStore;
///
/// #[async_trait]
/// impl SecretStore for StaticStore {
///     fn backend_name(&self) -> &'static str {
///         "static"
///     }
///
///     async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse> {
///         if request.secret_id == "app" {
///             Ok(SecretResponse::text(Some("1".to_string()), r#"{"Key":"value"}"#))
///         } else {
///             Err(SecretsError::not_found(&request.secret_id))
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Short name used in logs and error messages.
    fn backend_name(&self) -> &'static str;

    /// Fetch one version of a secret.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`](super::SecretsError::NotFound) if the secret or version doesn't exist
    /// - [`SecretsError::Unsupported`](super::SecretsError::Unsupported) if the selector cannot be honoured
    /// - any other variant for connectivity, authentication or backend failures
    async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse>;
}
