//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! Secret values never appear in log output. Events carry the secret name,
//! version ids and error descriptions only.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilitySettings;
use crate::errors::{ProviderError, Result};

/// Create a tracing span for a provider operation.
///
/// ```rust,ignore
/// let span = secret_span!("refresh", "prod/db");
/// let span = secret_span!("load", "prod/db", version_id = "v2");
/// ```
#[macro_export]
macro_rules! secret_span {
    ($operation:expr, $secret_name:expr) => {
        tracing::info_span!(
            "secret_operation",
            operation = %$operation,
            secret_name = %$secret_name,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $secret_name:expr, $($field:tt)*) => {
        tracing::info_span!(
            "secret_operation",
            operation = %$operation,
            secret_name = %$secret_name,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. A subscriber that
/// is already installed is left in place.
pub fn init_logging(settings: &ObservabilitySettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .map_err(|e| {
            ProviderError::config_with_source(
                format!("Invalid log level '{}'", settings.log_level),
                Box::new(e),
            )
        })?;

    let json_layer = settings
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json().with_current_span(true).with_target(false));
    let text_layer = (!settings.json_logs).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry().with(filter).with(json_layer).with(text_layer).try_init().ok();

    Ok(())
}

/// Log the effective settings at startup. Tokens are never logged.
pub fn log_settings_info(settings: &crate::config::AppSettings) {
    tracing::info!(
        secret_name = %settings.secret.name,
        backend = %settings.store.backend,
        optional = settings.secret.optional,
        watcher_enabled = settings.watcher.enabled,
        interval_seconds = settings.watcher.interval_seconds,
        metrics_port = settings.observability.metrics_port,
        "secrets-config settings"
    );
}
