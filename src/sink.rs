//! # Configuration Sink
//!
//! Where loaded configuration lands. The provider replaces the whole mapping
//! on every successful load or refresh and then signals a change; consumers
//! read values with [`ConfigurationSink::get`] and wait for changes through a
//! [`ReloadToken`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::processing::ConfigurationData;

/// Receiver side of the provider's output.
pub trait ConfigurationSink: Send + Sync {
    /// Replace every key with the contents of `data`.
    fn replace_all(&self, data: Arc<ConfigurationData>);

    /// Signal outstanding reload tokens that the data changed.
    fn notify_changed(&self);

    /// Case-insensitive lookup. Section entries and JSON nulls read as `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Token that fires on the next [`notify_changed`](Self::notify_changed).
    fn reload_token(&self) -> ReloadToken;
}

/// Change notification handle.
///
/// A token only observes notifications sent after it was created.
#[derive(Debug, Clone)]
pub struct ReloadToken {
    generation: watch::Receiver<u64>,
}

impl ReloadToken {
    /// Whether a change was signalled since this token was created or last awaited.
    pub fn has_changed(&self) -> bool {
        self.generation.has_changed().unwrap_or(false)
    }

    /// Wait for the next change. Returns `false` if the sink was dropped.
    pub async fn changed(&mut self) -> bool {
        self.generation.changed().await.is_ok()
    }

    /// Number of changes signalled by the sink so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

/// In-memory [`ConfigurationSink`] holding the latest snapshot.
#[derive(Debug)]
pub struct ConfigurationStore {
    data: ArcSwap<ConfigurationData>,
    generation: watch::Sender<u64>,
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        let (generation, _) = watch::channel(0);
        Self { data: ArcSwap::from_pointee(ConfigurationData::new()), generation }
    }
}

impl ConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The complete current mapping.
    pub fn snapshot(&self) -> Arc<ConfigurationData> {
        self.data.load_full()
    }

    /// Number of change notifications sent.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

impl ConfigurationSink for ConfigurationStore {
    fn replace_all(&self, data: Arc<ConfigurationData>) {
        self.data.store(data);
    }

    fn notify_changed(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.data.load().get(key).flatten().map(str::to_string)
    }

    fn reload_token(&self) -> ReloadToken {
        ReloadToken { generation: self.generation.subscribe() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(entries: &[(&str, Option<&str>)]) -> Arc<ConfigurationData> {
        Arc::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        )
    }

    #[test]
    fn test_replace_all_swaps_everything() {
        let store = ConfigurationStore::new();
        store.replace_all(data(&[("A", Some("1")), ("B", Some("2"))]));
        store.replace_all(data(&[("C", Some("3"))]));

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("c"), Some("3".to_string()));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_sections_read_as_none() {
        let store = ConfigurationStore::new();
        store.replace_all(data(&[("Db", None), ("Db:Host", Some("localhost"))]));

        assert_eq!(store.get("db"), None);
        assert_eq!(store.get("DB:HOST"), Some("localhost".to_string()));
    }

    #[test]
    fn test_token_sees_only_later_notifications() {
        let store = ConfigurationStore::new();
        store.notify_changed();

        let token = store.reload_token();
        assert!(!token.has_changed());

        store.notify_changed();
        assert!(token.has_changed());
        assert_eq!(store.generation(), 2);
    }

    #[tokio::test]
    async fn test_token_changed_wakes_waiter() {
        let store = Arc::new(ConfigurationStore::new());
        let mut token = store.reload_token();

        let notifier = Arc::clone(&store);
        tokio::spawn(async move { notifier.notify_changed() });

        assert!(token.changed().await);
        assert_eq!(token.generation(), 1);
        assert!(!token.has_changed());
    }
}
