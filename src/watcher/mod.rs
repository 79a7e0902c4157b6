//! # Configuration Watchers
//!
//! A watcher decides when the provider re-reads its secret. The provider hands
//! itself to [`ConfigurationWatcher::start`] as a weak [`RefreshTarget`] after
//! a successful load, so a watcher never keeps a dropped provider alive.

use std::sync::Weak;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::provider::RefreshOutcome;

pub mod polling;

pub use polling::PollingWatcher;

/// Something a watcher can refresh.
#[async_trait]
pub trait RefreshTarget: Send + Sync {
    /// Secret name, for log fields.
    fn secret_name(&self) -> &str;

    async fn refresh(&self) -> Result<RefreshOutcome>;
}

/// Triggers refreshes of a started target.
pub trait ConfigurationWatcher: Send + Sync {
    /// Begin watching.
    ///
    /// # Errors
    ///
    /// [`ProviderError::InvalidOperation`](crate::errors::ProviderError::InvalidOperation)
    /// when the watcher was started before, even if it has been stopped since.
    fn start(&self, target: Weak<dyn RefreshTarget>) -> Result<()>;

    /// Stop watching. Calling it again, or before `start`, does nothing.
    fn stop(&self);
}

/// What the polling loop does when a refresh returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherFailureMode {
    /// Log a warning and keep polling.
    #[default]
    Continue,
    /// Log an error, remember it and stop polling.
    Halt,
}

impl std::fmt::Display for WatcherFailureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatcherFailureMode::Continue => write!(f, "continue"),
            WatcherFailureMode::Halt => write!(f, "halt"),
        }
    }
}
