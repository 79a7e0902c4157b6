//! Error types for secret store operations.

use thiserror::Error;

/// Result type for secret store operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors reported by [`SecretStore`](super::SecretStore) implementations.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret (or the requested version of it) does not exist in the store.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// Failed to connect to the secret store.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Authentication with the secret store failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Invalid secret identifier or version selector.
    #[error("Invalid secret key: {key} - {reason}")]
    InvalidKey { key: String, reason: String },

    /// The store cannot honour the request (for example version stages).
    #[error("Unsupported by {backend} store: {message}")]
    Unsupported { backend: &'static str, message: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create an invalid key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into(), reason: reason.into() }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Unsupported { backend, message: message.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into(), source: None }
    }

    /// Create a backend error keeping the underlying cause.
    pub fn backend_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::BackendError { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretsError::NotFound { .. })
    }
}
