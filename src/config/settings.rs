//! # Configuration Settings
//!
//! Settings for the `secrets-config` binary and for applications wiring the
//! provider from configuration files.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{ProviderError, Result};
use crate::processing::DEFAULT_KEY_DELIMITER;
use crate::provider::{ProviderOptions, DEFAULT_TIMEOUT};
use crate::secrets::{SecretString, VersionSelector, DEFAULT_SECRET_PREFIX};
use crate::watcher::{PollingWatcher, WatcherFailureMode};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppSettings {
    /// Which secret to load and how to shape it
    #[validate(nested)]
    pub secret: SecretSettings,

    /// Where the secret is stored
    #[validate(nested)]
    pub store: StoreSettings,

    /// Change polling
    #[validate(nested)]
    pub watcher: WatcherSettings,

    /// Logging and metrics
    #[validate(nested)]
    pub observability: ObservabilitySettings,
}

impl AppSettings {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(ProviderError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Rules spanning several fields
    fn validate_custom(&self) -> Result<()> {
        if self.secret.version_id.is_some() && self.secret.version_stage.is_some() {
            return Err(ProviderError::validation_field(
                "Only one of version_id and version_stage can be set",
                "secret.version_id",
            ));
        }

        if self.store.backend == StoreBackend::Vault && self.secret.version_stage.is_some() {
            return Err(ProviderError::validation_field(
                "The vault backend does not support version stages",
                "secret.version_stage",
            ));
        }

        Ok(())
    }

    /// Provider options described by these settings.
    pub fn provider_options(&self) -> Result<ProviderOptions> {
        let version = VersionSelector::from_parts(
            self.secret.version_id.clone(),
            self.secret.version_stage.clone(),
        )
        .ok_or_else(|| {
            ProviderError::validation_field(
                "Only one of version_id and version_stage can be set",
                "secret.version_id",
            )
        })?;

        let mut builder = ProviderOptions::builder(self.secret.name.as_str())
            .optional(self.secret.optional)
            .version(version)
            .key_prefix(self.secret.key_prefix.as_str())
            .key_delimiter(self.secret.key_delimiter.as_str())
            .timeout(self.secret.timeout())
            .startup_failure_delay(self.secret.startup_failure_delay());

        if self.watcher.enabled {
            let watcher = PollingWatcher::new(self.watcher.interval())?
                .with_failure_mode(self.watcher.failure_mode);
            builder = builder.watcher(Arc::new(watcher));
        }

        builder.build()
    }
}

/// Secret selection and key shaping
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SecretSettings {
    /// Secret identifier in the store
    #[validate(length(min = 1, message = "Secret name cannot be empty"))]
    pub name: String,

    /// Tolerate load failures and start with empty configuration
    pub optional: bool,

    /// Pin an explicit version
    pub version_id: Option<String>,

    /// Pin a version stage label
    pub version_stage: Option<String>,

    /// Prefix for every configuration key
    pub key_prefix: String,

    /// Hierarchy delimiter of configuration keys
    #[validate(length(min = 1, message = "Key delimiter cannot be empty"))]
    pub key_delimiter: String,

    /// Bound on each store call in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Minimum duration of a failing startup load in milliseconds (0 = none)
    pub startup_failure_delay_ms: u64,
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            optional: false,
            version_id: None,
            version_stage: None,
            key_prefix: String::new(),
            key_delimiter: DEFAULT_KEY_DELIMITER.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            startup_failure_delay_ms: 0,
        }
    }
}

impl SecretSettings {
    /// Get store call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Get startup failure delay as Duration
    pub fn startup_failure_delay(&self) -> Duration {
        Duration::from_millis(self.startup_failure_delay_ms)
    }
}

/// Secret store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Environment variables (development only)
    #[default]
    Env,
    /// HashiCorp Vault KV v2
    Vault,
    /// AWS Secrets Manager (requires the `aws` feature)
    Aws,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Env => write!(f, "env"),
            StoreBackend::Vault => write!(f, "vault"),
            StoreBackend::Aws => write!(f, "aws"),
        }
    }
}

/// Secret store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,

    /// Variable prefix for the env backend
    #[validate(length(min = 1, message = "Environment prefix cannot be empty"))]
    pub env_prefix: String,

    /// Vault server address; falls back to `VAULT_ADDR`
    pub vault_address: Option<String>,

    /// Vault token
    pub vault_token: Option<SecretString>,

    /// Vault Enterprise namespace
    pub vault_namespace: Option<String>,

    /// KV v2 mount path
    #[validate(length(min = 1, message = "Vault KV mount cannot be empty"))]
    pub vault_kv_mount: String,

    /// AWS region; the default provider chain decides when unset
    pub aws_region: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Env,
            env_prefix: DEFAULT_SECRET_PREFIX.to_string(),
            vault_address: None,
            vault_token: None,
            vault_namespace: None,
            vault_kv_mount: "secret".to_string(),
            aws_region: None,
        }
    }
}

/// Polling watcher settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WatcherSettings {
    /// Poll the store for new versions
    pub enabled: bool,

    /// Polling interval in seconds
    #[validate(range(min = 1, message = "Polling interval must be at least 1 second"))]
    pub interval_seconds: u64,

    /// Reaction to a failed refresh
    pub failure_mode: WatcherFailureMode,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self { enabled: false, interval_seconds: 300, failure_mode: WatcherFailureMode::Continue }
    }
}

impl WatcherSettings {
    /// Get polling interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level or filter directives; `RUST_LOG` overrides it
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit JSON log lines
    pub json_logs: bool,

    /// Prometheus exporter port (0 = disabled)
    pub metrics_port: u16,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logs: false, metrics_port: 0 }
    }
}

impl ObservabilitySettings {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}
