//! # Configuration Management
//!
//! Settings are layered: built-in defaults, then an optional file (TOML, YAML
//! or JSON, picked by extension), then environment variables.
//!
//! Environment variables use the `SECRETS_CONFIG_` prefix and `__` between
//! nested names:
//!
//! ```bash
//! SECRETS_CONFIG_SECRET__NAME=prod/db
//! SECRETS_CONFIG_STORE__BACKEND=vault
//! SECRETS_CONFIG_WATCHER__ENABLED=true
//! ```

use std::path::Path;

use config::{Config, Environment, File};
use tracing::debug;

use crate::errors::Result;

pub mod settings;

pub use settings::{
    AppSettings, ObservabilitySettings, SecretSettings, StoreBackend, StoreSettings,
    WatcherSettings,
};

/// Prefix of settings environment variables.
pub const ENV_PREFIX: &str = "SECRETS_CONFIG";

/// Load and validate settings from `path` (when given) and the environment.
///
/// # Errors
///
/// [`ProviderError::Config`](crate::errors::ProviderError::Config) when a
/// source cannot be read or deserialized,
/// [`ProviderError::Validation`](crate::errors::ProviderError::Validation)
/// when the merged settings are invalid.
pub fn load_settings(path: Option<&Path>) -> Result<AppSettings> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        debug!(path = %path.display(), "Reading settings file");
        builder = builder.add_source(File::from(path).required(true));
    }

    let settings: AppSettings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}
