//! # Observability Infrastructure
//!
//! Structured logging and Prometheus metrics for the secrets provider.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_settings_info};
pub use metrics::{init_metrics, MetricsRecorder};

use crate::config::ObservabilitySettings;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging, then metrics when a port is configured
pub fn init_observability(settings: &ObservabilitySettings) -> Result<()> {
    init_logging(settings)?;
    init_metrics(settings)?;

    info!(
        log_level = %settings.log_level,
        json_logs = settings.json_logs,
        metrics_port = settings.metrics_port,
        "Observability initialized successfully"
    );

    Ok(())
}

