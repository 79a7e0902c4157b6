//! # Error Types
//!
//! Error types for the secrets configuration provider using `thiserror`.

/// Custom result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for loading and refreshing secret-backed configuration
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    /// Secret payload is not a JSON object or array
    #[error("Secret '{secret_name}' cannot be parsed, expected a JSON object or array")]
    Parse { secret_name: String },

    /// Secret identifier does not exist in the store
    #[error("Secret {secret_id} not found")]
    NotFound {
        secret_id: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Any other failure while retrieving a secret
    #[error("Secret retrieval failed: {message}")]
    Retrieval {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Operation exceeded its time budget
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Invalid provider or application configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Settings failed validation
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// API misuse, such as starting a watcher twice
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
}

impl ProviderError {
    /// Create a parse error for the named secret
    pub fn parse<S: Into<String>>(secret_name: S) -> Self {
        Self::Parse { secret_name: secret_name.into() }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(secret_id: S) -> Self {
        Self::NotFound { secret_id: secret_id.into(), source: None }
    }

    /// Create a not found error keeping the store error as source
    pub fn not_found_with_source<S: Into<String>>(secret_id: S, source: BoxError) -> Self {
        Self::NotFound { secret_id: secret_id.into(), source: Some(source) }
    }

    /// Create a retrieval error
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval { message: message.into(), source: None }
    }

    /// Create a retrieval error with source
    pub fn retrieval_with_source<S: Into<String>>(message: S, source: BoxError) -> Self {
        Self::Retrieval { message: message.into(), source: Some(source) }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(message: S, source: BoxError) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create an invalid operation error
    pub fn invalid_operation<S: Into<String>>(message: S) -> Self {
        Self::InvalidOperation { message: message.into() }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Programming errors fail fast and are never handed to exception handlers.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            ProviderError::Config { .. }
                | ProviderError::Validation { .. }
                | ProviderError::InvalidOperation { .. }
        )
    }

    /// Check whether the secret does not exist in the store
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Short, stable name used in log fields and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Parse { .. } => "parse",
            ProviderError::NotFound { .. } => "not_found",
            ProviderError::Retrieval { .. } => "retrieval",
            ProviderError::Timeout { .. } => "timeout",
            ProviderError::Config { .. } => "config",
            ProviderError::Validation { .. } => "validation",
            ProviderError::InvalidOperation { .. } => "invalid_operation",
            ProviderError::Io { .. } => "io",
        }
    }

    /// Shape a failed load for the caller.
    ///
    /// `NotFound` and `Retrieval` are returned unchanged; every other failure is
    /// wrapped in a `Retrieval` error naming the secret.
    pub fn into_load_failure(self, secret_name: &str) -> Self {
        match self {
            err @ (ProviderError::NotFound { .. } | ProviderError::Retrieval { .. }) => err,
            err if err.is_programming_error() => err,
            err => Self::retrieval_with_source(
                format!("Failed to load secret '{}'", secret_name),
                Box::new(err),
            ),
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<config::ConfigError> for ProviderError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for ProviderError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
