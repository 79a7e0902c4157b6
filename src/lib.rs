//! # secrets-config
//!
//! Configuration backed by a versioned secret store. The provider fetches one
//! secret, parses it as JSON, flattens it into delimiter-joined keys and
//! publishes the result to a configuration sink. A polling watcher can refresh
//! it whenever the store reports a new version.
//!
//! ## Pipeline
//!
//! ```text
//! SecretStore → SecretFetcher → SecretProcessor → ConfigurationSink
//!                    ↑                                   ↓
//!            ConfigurationWatcher               ReloadToken listeners
//! ```
//!
//! ## Core Components
//!
//! - **Secret stores**: environment variables, in-memory, Vault KV v2 and AWS Secrets Manager
//! - **Processing**: JSON parser, tree tokenizer and key transformer chain
//! - **Provider**: load and refresh state machine with exception handlers
//! - **Watcher**: interval polling on the tokio runtime
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use secrets_config::{InMemorySecretStore, ProviderOptions, SecretsConfigurationProvider};
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(InMemorySecretStore::new());
//! store.put_string("prod/db", r#"{"Db":{"Host":"db.internal","Port":5432}}"#);
//!
//! let options = ProviderOptions::builder("prod/db").build().unwrap();
//! let provider = SecretsConfigurationProvider::new(store, options);
//! provider.load().await.unwrap();
//!
//! assert_eq!(provider.get("db:port"), Some("5432".to_string()));
//! # });
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod processing;
pub mod provider;
pub mod secrets;
pub mod sink;
pub mod watcher;

// Re-export commonly used types and traits
pub use config::{load_settings, AppSettings};
pub use errors::{ProviderError, Result};
pub use processing::{
    ConfigurationData, JsonSecretProcessor, KeyTransformer, KeyTransformerChain,
    ProcessingOptions, SecretProcessor,
};
pub use provider::{
    ExceptionContext, ProviderOptions, ProviderOptionsBuilder, RefreshOutcome,
    SecretsConfigurationProvider,
};
pub use secrets::{InMemorySecretStore, SecretStore, VersionSelector};
pub use sink::{ConfigurationSink, ConfigurationStore, ReloadToken};
pub use watcher::{ConfigurationWatcher, PollingWatcher, WatcherFailureMode};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
