//! # Metrics Collection
//!
//! Prometheus metrics for secret loads, refreshes and the polling watcher.
//! Without an installed exporter the `metrics` macros are no-ops, so library
//! users pay nothing unless they opt in.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

use crate::config::ObservabilitySettings;
use crate::errors::{ProviderError, Result};

/// Records provider metrics through the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record the outcome of a load or refresh
    pub fn record_operation(&self, operation: &str, outcome: &str) {
        let labels = [("operation", operation.to_string()), ("outcome", outcome.to_string())];
        counter!("secret_operations_total", &labels).increment(1);
    }

    /// Record how long a store call took, in seconds
    pub fn record_fetch_duration(&self, operation: &str, duration: f64) {
        let labels = [("operation", operation.to_string())];
        histogram!("secret_fetch_duration_seconds", &labels).record(duration);
    }

    /// Update the number of configuration entries loaded from a secret
    pub fn set_configuration_entries(&self, secret: &str, count: usize) {
        let labels = [("secret", secret.to_string())];
        gauge!("secret_configuration_entries", &labels).set(count as f64);
    }

    /// Record one watcher tick
    pub fn record_watcher_tick(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("secret_watcher_ticks_total", &labels).increment(1);
    }

    /// Register metric descriptions
    pub fn register_secret_metrics(&self) {
        describe_counter!(
            "secret_operations_total",
            Unit::Count,
            "Secret loads and refreshes by operation and outcome"
        );
        describe_histogram!(
            "secret_fetch_duration_seconds",
            Unit::Seconds,
            "Time spent fetching a secret from the store"
        );
        describe_gauge!(
            "secret_configuration_entries",
            Unit::Count,
            "Configuration entries produced by the current secret version"
        );
        describe_counter!(
            "secret_watcher_ticks_total",
            Unit::Count,
            "Polling watcher ticks by refresh outcome"
        );
    }
}

/// Install the Prometheus exporter when a metrics port is configured.
pub fn init_metrics(settings: &ObservabilitySettings) -> Result<()> {
    let metrics_addr = match settings.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no metrics port configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        ProviderError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", crate::APP_NAME)
        .install()
        .map_err(|e| ProviderError::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    MetricsRecorder::new().register_secret_metrics();

    info!(metrics_addr = %metrics_addr, "Metrics collection initialized");

    Ok(())
}
