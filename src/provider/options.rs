//! Provider options and their builder.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::exception::{ExceptionContext, ExceptionHandler};
use crate::errors::{ProviderError, Result};
use crate::processing::{
    JsonSecretProcessor, KeyTransformer, KeyTransformerChain, ProcessingOptions, SecretProcessor,
    DEFAULT_KEY_DELIMITER,
};
use crate::secrets::VersionSelector;
use crate::watcher::{ConfigurationWatcher, PollingWatcher};

/// Default bound on a single store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24);

/// Everything a [`SecretsConfigurationProvider`](super::SecretsConfigurationProvider) is built from.
///
/// Construct with [`ProviderOptions::builder`].
#[derive(Clone)]
pub struct ProviderOptions {
    pub(crate) secret_name: String,
    pub(crate) version: VersionSelector,
    pub(crate) optional: bool,
    pub(crate) key_prefix: String,
    pub(crate) key_delimiter: String,
    pub(crate) processor: Arc<dyn SecretProcessor>,
    pub(crate) key_transformers: KeyTransformerChain,
    pub(crate) watcher: Option<Arc<dyn ConfigurationWatcher>>,
    pub(crate) timeout: Duration,
    pub(crate) startup_failure_delay: Duration,
    pub(crate) on_load_exception: Option<ExceptionHandler>,
    pub(crate) on_refresh_exception: Option<ExceptionHandler>,
}

impl fmt::Debug for ProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderOptions")
            .field("secret_name", &self.secret_name)
            .field("version", &self.version)
            .field("optional", &self.optional)
            .field("key_prefix", &self.key_prefix)
            .field("key_delimiter", &self.key_delimiter)
            .field("key_transformers", &self.key_transformers)
            .field("watcher", &self.watcher.is_some())
            .field("timeout", &self.timeout)
            .field("startup_failure_delay", &self.startup_failure_delay)
            .finish()
    }
}

impl ProviderOptions {
    pub fn builder(secret_name: impl Into<String>) -> ProviderOptionsBuilder {
        ProviderOptionsBuilder::new(secret_name)
    }

    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    pub fn version(&self) -> &VersionSelector {
        &self.version
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn key_delimiter(&self) -> &str {
        &self.key_delimiter
    }

    pub fn key_transformers(&self) -> &KeyTransformerChain {
        &self.key_transformers
    }

    pub fn watcher(&self) -> Option<&Arc<dyn ConfigurationWatcher>> {
        self.watcher.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn startup_failure_delay(&self) -> Duration {
        self.startup_failure_delay
    }

    pub(crate) fn processing_options(&self) -> ProcessingOptions {
        ProcessingOptions::new(self.secret_name.as_str())
            .with_key_prefix(self.key_prefix.as_str())
            .with_key_transformers(self.key_transformers.clone())
    }
}

/// Builder for [`ProviderOptions`].
///
/// ```rust
/// use std::time::Duration;
/// use secrets_config::provider::ProviderOptions;
///
/// let options = ProviderOptions::builder("prod/db")
///     .key_prefix("Database")
///     .optional(true)
///     .polling_watcher(Duration::from_secs(300))
///     .build()
///     .unwrap();
///
/// assert_eq!(options.key_prefix(), "Database");
/// assert!(options.watcher().is_some());
/// ```
#[must_use]
pub struct ProviderOptionsBuilder {
    secret_name: String,
    version: VersionSelector,
    optional: bool,
    key_prefix: String,
    key_delimiter: String,
    processor: Option<Arc<dyn SecretProcessor>>,
    base_transformers: Option<KeyTransformerChain>,
    extra_transformers: Vec<Arc<dyn KeyTransformer>>,
    watcher: Option<Arc<dyn ConfigurationWatcher>>,
    polling_interval: Option<Duration>,
    timeout: Duration,
    startup_failure_delay: Duration,
    on_load_exception: Option<ExceptionHandler>,
    on_refresh_exception: Option<ExceptionHandler>,
}

impl ProviderOptionsBuilder {
    fn new(secret_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            version: VersionSelector::Latest,
            optional: false,
            key_prefix: String::new(),
            key_delimiter: DEFAULT_KEY_DELIMITER.to_string(),
            processor: None,
            base_transformers: None,
            extra_transformers: Vec::new(),
            watcher: None,
            polling_interval: None,
            timeout: DEFAULT_TIMEOUT,
            startup_failure_delay: Duration::ZERO,
            on_load_exception: None,
            on_refresh_exception: None,
        }
    }

    /// Tolerate load failures instead of returning them.
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn version(mut self, version: VersionSelector) -> Self {
        self.version = version;
        self
    }

    pub fn version_id(self, version_id: impl Into<String>) -> Self {
        self.version(VersionSelector::Id(version_id.into()))
    }

    pub fn version_stage(self, stage: impl Into<String>) -> Self {
        self.version(VersionSelector::Stage(stage.into()))
    }

    /// Prefix for every key. Empty (the default) puts keys at the root.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Delimiter used by the default processor and transformer chain.
    pub fn key_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.key_delimiter = delimiter.into();
        self
    }

    pub fn processor(mut self, processor: impl SecretProcessor + 'static) -> Self {
        self.processor = Some(Arc::new(processor));
        self
    }

    /// Append a transformer after the ones configured so far.
    pub fn key_transformer(mut self, transformer: impl KeyTransformer + 'static) -> Self {
        self.extra_transformers.push(Arc::new(transformer));
        self
    }

    /// Drop every transformer, including the default delimiter transformer.
    pub fn clear_key_transformers(mut self) -> Self {
        self.base_transformers = Some(KeyTransformerChain::empty());
        self.extra_transformers.clear();
        self
    }

    /// Replace the whole chain.
    pub fn key_transformers(mut self, chain: KeyTransformerChain) -> Self {
        self.base_transformers = Some(chain);
        self.extra_transformers.clear();
        self
    }

    pub fn watcher(mut self, watcher: Arc<dyn ConfigurationWatcher>) -> Self {
        self.watcher = Some(watcher);
        self.polling_interval = None;
        self
    }

    /// Poll for new versions every `interval`.
    pub fn polling_watcher(mut self, interval: Duration) -> Self {
        self.polling_interval = Some(interval);
        self.watcher = None;
        self
    }

    /// Bound on each store call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Minimum time a failing, non-ignored load takes before returning its error.
    pub fn startup_failure_delay(mut self, delay: Duration) -> Self {
        self.startup_failure_delay = delay;
        self
    }

    pub fn on_load_exception<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ExceptionContext<'_>) + Send + Sync + 'static,
    {
        self.on_load_exception = Some(Arc::new(handler));
        self
    }

    pub fn on_refresh_exception<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ExceptionContext<'_>) + Send + Sync + 'static,
    {
        self.on_refresh_exception = Some(Arc::new(handler));
        self
    }

    /// # Errors
    ///
    /// [`ProviderError::Config`] for a blank secret name, a zero timeout, an
    /// empty key delimiter or a zero polling interval.
    pub fn build(self) -> Result<ProviderOptions> {
        if self.secret_name.trim().is_empty() {
            return Err(ProviderError::config("Secret name must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ProviderError::config("Timeout must be greater than zero"));
        }
        if self.key_delimiter.is_empty() {
            return Err(ProviderError::config("Key delimiter must not be empty"));
        }

        let watcher = match self.polling_interval {
            Some(interval) => Some(Arc::new(PollingWatcher::new(interval)?) as Arc<dyn ConfigurationWatcher>),
            None => self.watcher,
        };

        let processor = self.processor.unwrap_or_else(|| {
            Arc::new(JsonSecretProcessor::json_with_delimiter(&self.key_delimiter))
        });

        let mut key_transformers = self
            .base_transformers
            .unwrap_or_else(|| KeyTransformerChain::with_delimiter(&self.key_delimiter));
        for transformer in self.extra_transformers {
            key_transformers.push_shared(transformer);
        }

        Ok(ProviderOptions {
            secret_name: self.secret_name,
            version: self.version,
            optional: self.optional,
            key_prefix: self.key_prefix,
            key_delimiter: self.key_delimiter,
            processor,
            key_transformers,
            watcher,
            timeout: self.timeout,
            startup_failure_delay: self.startup_failure_delay,
            on_load_exception: self.on_load_exception,
            on_refresh_exception: self.on_refresh_exception,
        })
    }
}
