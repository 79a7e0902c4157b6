//! Interval-driven watcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{ConfigurationWatcher, RefreshTarget, WatcherFailureMode};
use crate::errors::{ProviderError, Result};
use crate::observability::MetricsRecorder;

/// Calls [`RefreshTarget::refresh`] every `interval`, first one interval
/// after [`start`](ConfigurationWatcher::start).
///
/// Ticks run on the Tokio clock. A refresh that outlasts the interval delays
/// the next tick instead of queueing a burst.
#[derive(Debug)]
pub struct PollingWatcher {
    interval: Duration,
    failure_mode: WatcherFailureMode,
    started: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl PollingWatcher {
    /// # Errors
    ///
    /// [`ProviderError::Config`] when `interval` is zero.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ProviderError::config("Polling interval must be greater than zero"));
        }

        Ok(Self {
            interval,
            failure_mode: WatcherFailureMode::default(),
            started: AtomicBool::new(false),
            task: Mutex::new(None),
            last_error: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_failure_mode(mut self, failure_mode: WatcherFailureMode) -> Self {
        self.failure_mode = failure_mode;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn failure_mode(&self) -> WatcherFailureMode {
        self.failure_mode
    }

    /// Whether the polling task is alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Error that halted polling under [`WatcherFailureMode::Halt`].
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ConfigurationWatcher for PollingWatcher {
    fn start(&self, target: Weak<dyn RefreshTarget>) -> Result<()> {
        let handle = Handle::try_current().map_err(|_| {
            ProviderError::invalid_operation("Polling watcher must be started within a Tokio runtime")
        })?;

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ProviderError::invalid_operation(
                "Watcher is already started, have you re-used watcher instance?",
            ));
        }

        let interval = self.interval;
        let failure_mode = self.failure_mode;
        let last_error = Arc::clone(&self.last_error);
        let metrics = MetricsRecorder::new();

        let task = handle.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(target) = target.upgrade() else {
                    debug!("Refresh target dropped, stopping polling watcher");
                    break;
                };

                match target.refresh().await {
                    Ok(outcome) => metrics.record_watcher_tick(outcome.label()),
                    Err(e) => {
                        metrics.record_watcher_tick("error");
                        match failure_mode {
                            WatcherFailureMode::Continue => {
                                warn!(secret_name = %target.secret_name(), error = %e, "Secret refresh failed, polling continues");
                            }
                            WatcherFailureMode::Halt => {
                                error!(secret_name = %target.secret_name(), error = %e, "Secret refresh failed, polling halted");
                                *last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                                    Some(e.to_string());
                                break;
                            }
                        }
                    }
                }
            }
        });

        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        info!(interval_ms = interval.as_millis() as u64, failure_mode = %failure_mode, "Polling watcher started");

        Ok(())
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
            debug!("Polling watcher stopped");
        }
    }
}

impl Drop for PollingWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
