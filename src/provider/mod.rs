//! # Secrets Configuration Provider
//!
//! Loads one secret into a [`ConfigurationSink`] and keeps it current.
//!
//! The provider starts unloaded. [`load`](SecretsConfigurationProvider::load)
//! runs once at startup; afterwards [`refresh`](SecretsConfigurationProvider::refresh)
//! re-reads the secret, either on demand or from the configured watcher, and
//! only replaces the configuration when the store reports a different
//! version id.
//!
//! ```rust
//! use std::sync::Arc;
//! use secrets_config::provider::{ProviderOptions, RefreshOutcome, SecretsConfigurationProvider};
//! use secrets_config::secrets::InMemorySecretStore;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemorySecretStore::new());
//! store.put_string("prod/db", r#"{"Database": {"Host": "db.internal", "Port": 5432}}"#);
//!
//! let options = ProviderOptions::builder("prod/db").build().unwrap();
//! let provider = SecretsConfigurationProvider::new(store.clone(), options);
//! provider.load().await.unwrap();
//! assert_eq!(provider.get("Database:Port").as_deref(), Some("5432"));
//!
//! store.put_string("prod/db", r#"{"Database": {"Host": "db2.internal"}}"#);
//! assert!(matches!(provider.refresh().await.unwrap(), RefreshOutcome::Updated { .. }));
//! assert_eq!(provider.get("database:host").as_deref(), Some("db2.internal"));
//! # });
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn, Instrument};

pub mod exception;
pub mod options;

pub use exception::{ignore_all, ignore_not_found, ExceptionContext, ExceptionHandler, SecretOperation};
pub use options::{ProviderOptions, ProviderOptionsBuilder, DEFAULT_TIMEOUT};

use crate::errors::{ProviderError, Result};
use crate::observability::MetricsRecorder;
use crate::processing::{ConfigurationData, ProcessingOptions};
use crate::secret_span;
use crate::secrets::{SecretFetcher, SecretPayload, SecretStore};
use crate::sink::{ConfigurationSink, ConfigurationStore, ReloadToken};
use crate::watcher::RefreshTarget;

/// Result of a [`refresh`](SecretsConfigurationProvider::refresh) that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was running; nothing was fetched.
    Skipped,
    /// The store reported the version already loaded.
    Unchanged { version_id: String },
    /// A new version was loaded and the sink notified.
    Updated { previous_version_id: Option<String>, version_id: String },
    /// The refresh failed and the refresh exception handler ignored it.
    FailureIgnored,
}

impl RefreshOutcome {
    /// Metric and log label.
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Skipped => "skipped",
            RefreshOutcome::Unchanged { .. } => "unchanged",
            RefreshOutcome::Updated { .. } => "ok",
            RefreshOutcome::FailureIgnored => "ignored",
        }
    }
}

/// Snapshot, version and load time, always swapped together.
#[derive(Debug, Clone, Default)]
pub struct ProviderState {
    pub data: Arc<ConfigurationData>,
    pub version_id: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Secret-backed configuration source.
///
/// Always held in an [`Arc`]: a started watcher refers back to the provider
/// through a weak reference, and dropping the last `Arc` stops it.
pub struct SecretsConfigurationProvider {
    options: ProviderOptions,
    processing: ProcessingOptions,
    fetcher: SecretFetcher,
    sink: Arc<dyn ConfigurationSink>,
    state: ArcSwap<ProviderState>,
    /// Held while a load or refresh fetches and publishes a version.
    refresh_slot: Mutex<()>,
    load_started: AtomicBool,
    metrics: MetricsRecorder,
}

impl fmt::Debug for SecretsConfigurationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretsConfigurationProvider")
            .field("options", &self.options)
            .field("fetcher", &self.fetcher)
            .field("version_id", &self.state.load().version_id)
            .field("refreshing", &self.refresh_slot.try_lock().is_err())
            .finish()
    }
}

impl SecretsConfigurationProvider {
    /// Provider writing into its own [`ConfigurationStore`].
    pub fn new(store: Arc<dyn SecretStore>, options: ProviderOptions) -> Arc<Self> {
        Self::with_sink(store, options, Arc::new(ConfigurationStore::new()))
    }

    pub fn with_sink(
        store: Arc<dyn SecretStore>,
        options: ProviderOptions,
        sink: Arc<dyn ConfigurationSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            processing: options.processing_options(),
            options,
            fetcher: SecretFetcher::new(store),
            sink,
            state: ArcSwap::from_pointee(ProviderState::default()),
            refresh_slot: Mutex::new(()),
            load_started: AtomicBool::new(false),
            metrics: MetricsRecorder::new(),
        })
    }

    /// Initial load. Call once, at startup.
    ///
    /// On success the configured watcher is started. On failure the load
    /// exception handler decides; `optional` providers tolerate failures by
    /// default and stay empty.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidOperation`] on a second call
    /// - [`ProviderError::NotFound`] when the secret does not exist
    /// - [`ProviderError::Retrieval`] for every other failure not ignored
    pub async fn load(self: &Arc<Self>) -> Result<()> {
        if self.load_started.swap(true, Ordering::SeqCst) {
            return Err(ProviderError::invalid_operation(format!(
                "Secret '{}' has already been loaded, load can only be called once",
                self.options.secret_name
            )));
        }

        let span = secret_span!(SecretOperation::Load, self.options.secret_name);
        self.load_inner().instrument(span).await
    }

    async fn load_inner(self: &Arc<Self>) -> Result<()> {
        let started = Instant::now();

        let result = {
            // load and refresh never publish concurrently
            let _slot = self.refresh_slot.lock().await;
            match self.fetch(SecretOperation::Load).await {
                Ok(payload) => self.process(&payload).map(|data| {
                    let entries = data.len();
                    self.set_data(payload.version_id.clone(), data);
                    (payload.version_id, entries)
                }),
                Err(e) => Err(e),
            }
        };

        match result {
            Ok((version_id, entries)) => {
                info!(
                    secret_name = %self.options.secret_name,
                    version_id = %version_id,
                    entries,
                    "Secret loaded"
                );
                self.metrics.record_operation(SecretOperation::Load.as_str(), "ok");

                if let Some(watcher) = &self.options.watcher {
                    let target: Arc<dyn RefreshTarget> = Arc::clone(self) as Arc<dyn RefreshTarget>;
                    watcher.start(Arc::downgrade(&target))?;
                }
                Ok(())
            }
            Err(err) => self.handle_load_failure(err, started).await,
        }
    }

    async fn handle_load_failure(&self, err: ProviderError, started: Instant) -> Result<()> {
        let secret_name = self.options.secret_name.as_str();

        if err.is_programming_error() {
            error!(secret_name = %secret_name, error = %err, "Failed to load secret");
            self.metrics.record_operation(SecretOperation::Load.as_str(), "error");
            return Err(err);
        }

        error!(secret_name = %secret_name, error = %err, kind = err.kind(), "Failed to load secret");

        let ignore = {
            let mut ctx = ExceptionContext {
                operation: SecretOperation::Load,
                secret_name,
                error: &err,
                elapsed: started.elapsed(),
                ignore: self.options.optional,
            };
            if let Some(handler) = &self.options.on_load_exception {
                handler(&mut ctx);
            }
            ctx.ignore
        };

        if ignore {
            warn!(secret_name = %secret_name, "Secret load failure ignored, configuration stays empty");
            self.metrics.record_operation(SecretOperation::Load.as_str(), "ignored");
            return Ok(());
        }

        self.metrics.record_operation(SecretOperation::Load.as_str(), "error");

        let remaining = self.options.startup_failure_delay.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            debug!(secret_name = %secret_name, delay_ms = remaining.as_millis() as u64, "Delaying load failure");
            time::sleep(remaining).await;
        }

        Err(err.into_load_failure(secret_name))
    }

    /// Re-read the secret and apply it when its version changed.
    ///
    /// Calls overlapping another refresh or a running
    /// [`load`](Self::load) return [`RefreshOutcome::Skipped`] without
    /// touching the store.
    ///
    /// # Errors
    ///
    /// The refresh failure, unless the refresh exception handler ignored it.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Ok(_slot) = self.refresh_slot.try_lock() else {
            debug!(secret_name = %self.options.secret_name, "Refresh already in progress, skipping");
            self.metrics.record_operation(SecretOperation::Refresh.as_str(), RefreshOutcome::Skipped.label());
            return Ok(RefreshOutcome::Skipped);
        };

        let span = secret_span!(SecretOperation::Refresh, self.options.secret_name);
        let started = Instant::now();

        match self.refresh_inner().instrument(span).await {
            Ok(outcome) => {
                self.metrics.record_operation(SecretOperation::Refresh.as_str(), outcome.label());
                Ok(outcome)
            }
            Err(err) => self.handle_refresh_failure(err, started),
        }
    }

    async fn refresh_inner(&self) -> Result<RefreshOutcome> {
        let payload = self.fetch(SecretOperation::Refresh).await?;

        let previous_version_id = self.state.load().version_id.clone();
        if previous_version_id.as_deref() == Some(payload.version_id.as_str()) {
            info!(
                secret_name = %self.options.secret_name,
                version_id = %payload.version_id,
                "Secret already loaded, skipping refresh"
            );
            return Ok(RefreshOutcome::Unchanged { version_id: payload.version_id });
        }

        let data = self.process(&payload)?;
        self.set_data(payload.version_id.clone(), data);

        info!(
            secret_name = %self.options.secret_name,
            previous_version_id = previous_version_id.as_deref().unwrap_or("none"),
            version_id = %payload.version_id,
            "Secret refreshed"
        );

        Ok(RefreshOutcome::Updated { previous_version_id, version_id: payload.version_id })
    }

    fn handle_refresh_failure(&self, err: ProviderError, started: Instant) -> Result<RefreshOutcome> {
        let secret_name = self.options.secret_name.as_str();
        error!(secret_name = %secret_name, error = %err, kind = err.kind(), "Failed to refresh secret");

        if err.is_programming_error() {
            self.metrics.record_operation(SecretOperation::Refresh.as_str(), "error");
            return Err(err);
        }

        let mut ctx = ExceptionContext {
            operation: SecretOperation::Refresh,
            secret_name,
            error: &err,
            elapsed: started.elapsed(),
            ignore: false,
        };
        if let Some(handler) = &self.options.on_refresh_exception {
            handler(&mut ctx);
        }

        if ctx.ignore {
            self.metrics.record_operation(SecretOperation::Refresh.as_str(), RefreshOutcome::FailureIgnored.label());
            Ok(RefreshOutcome::FailureIgnored)
        } else {
            self.metrics.record_operation(SecretOperation::Refresh.as_str(), "error");
            Err(err)
        }
    }

    async fn fetch(&self, operation: SecretOperation) -> Result<SecretPayload> {
        let timeout = self.options.timeout;
        let started = Instant::now();

        let result = time::timeout(
            timeout,
            self.fetcher.get_secret(&self.options.secret_name, &self.options.version),
        )
        .await;
        self.metrics.record_fetch_duration(operation.as_str(), started.elapsed().as_secs_f64());

        result.map_err(|_| ProviderError::timeout("fetch_secret", timeout.as_millis() as u64))?
    }

    fn process(&self, payload: &SecretPayload) -> Result<ConfigurationData> {
        self.options
            .processor
            .get_configuration_data(&self.processing, payload.value.expose_secret())
    }

    fn set_data(&self, version_id: String, data: ConfigurationData) {
        let data = Arc::new(data);
        self.metrics.set_configuration_entries(&self.options.secret_name, data.len());

        self.state.store(Arc::new(ProviderState {
            data: Arc::clone(&data),
            version_id: Some(version_id),
            loaded_at: Some(Utc::now()),
        }));

        self.sink.replace_all(data);
        self.sink.notify_changed();
    }

    pub fn secret_name(&self) -> &str {
        &self.options.secret_name
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    /// Current snapshot; empty before the first successful load.
    pub fn snapshot(&self) -> Arc<ConfigurationData> {
        Arc::clone(&self.state.load().data)
    }

    pub fn state(&self) -> Arc<ProviderState> {
        self.state.load_full()
    }

    pub fn version_id(&self) -> Option<String> {
        self.state.load().version_id.clone()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.load().loaded_at
    }

    pub fn is_loaded(&self) -> bool {
        self.state.load().version_id.is_some()
    }

    /// Case-insensitive lookup in the current snapshot.
    pub fn get(&self, key: &str) -> Option<String> {
        self.state.load().data.get(key).flatten().map(str::to_string)
    }

    pub fn sink(&self) -> &Arc<dyn ConfigurationSink> {
        &self.sink
    }

    pub fn reload_token(&self) -> ReloadToken {
        self.sink.reload_token()
    }

    /// Stop the watcher, if any. Refreshes can still be triggered by hand.
    pub fn stop_watching(&self) {
        if let Some(watcher) = &self.options.watcher {
            watcher.stop();
        }
    }
}

#[async_trait]
impl RefreshTarget for SecretsConfigurationProvider {
    fn secret_name(&self) -> &str {
        &self.options.secret_name
    }

    async fn refresh(&self) -> Result<RefreshOutcome> {
        SecretsConfigurationProvider::refresh(self).await
    }
}

impl Drop for SecretsConfigurationProvider {
    fn drop(&mut self) {
        self.stop_watching();
    }
}
