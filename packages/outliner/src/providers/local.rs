//! Provider backed by durable key-value storage with debounced writes.
//!
//! There is no network round-trip: `connect` passes through `Connecting`
//! straight to `Connected` and then fires one update so the host pulls the
//! stored snapshot.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{ConnectionCallback, DocumentProvider, JsonSnapshot, UpdateCallback, WritableProvider};
use crate::config::OutlinerConfig;
use crate::connection::{ConnectionMachine, ConnectionState};
use crate::errors::{PersistError, ProviderError};
use crate::snapshot_store::SnapshotStore;
use crate::storage::KeyValueStorage;
use crate::subscription::{SubscriberSet, Subscription};

pub struct LocalDocProvider<T = JsonSnapshot> {
    id: String,
    connection: ConnectionMachine,
    updates: SubscriberSet<()>,
    store: SnapshotStore<T>,
}

impl<T> LocalDocProvider<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Provider storing under `outliner-<id>` with the default quiet period
    pub fn new(id: impl Into<String>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::from_config(id, &OutlinerConfig::default(), storage)
    }

    /// Provider storing under an explicit key
    pub fn with_storage_key(
        id: impl Into<String>,
        storage_key: impl Into<String>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let config = OutlinerConfig::default();
        Self::build(id.into(), storage_key.into(), storage, config.debounce())
    }

    /// Provider using the key prefix and quiet period from `config`
    pub fn from_config(
        id: impl Into<String>,
        config: &OutlinerConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let id = id.into();
        let key = config.storage_key(&id);
        Self::build(id, key, storage, config.debounce())
    }

    fn build(id: String, key: String, storage: Arc<dyn KeyValueStorage>, quiet_period: Duration) -> Self {
        tracing::debug!(id = %id, key = %key, "creating local document provider");
        Self {
            id,
            connection: ConnectionMachine::new(),
            updates: SubscriberSet::new(),
            store: SnapshotStore::new(key, storage, quiet_period),
        }
    }

    pub fn storage_key(&self) -> &str {
        self.store.key()
    }

    pub fn quiet_period(&self) -> Duration {
        self.store.quiet_period()
    }

    /// Commit the pending snapshot immediately
    pub fn flush(&self) -> bool {
        self.store.flush()
    }

    pub fn has_pending_write(&self) -> bool {
        self.store.has_pending()
    }

    /// Observe snapshot writes that were dropped because of a fault
    pub fn on_persist_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Arc<PersistError>) + Send + Sync + 'static,
    {
        self.store.on_persist_error(callback)
    }

    /// Forget the stored document and any pending write
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[async_trait]
impl<T> DocumentProvider for LocalDocProvider<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    type Snapshot = T;

    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&self) -> Result<(), ProviderError> {
        let Some(attempt) = self.connection.begin_connect() else {
            return Ok(());
        };

        // Storage is local, so the session is available immediately
        if self.connection.complete_connect(attempt) {
            self.updates.notify(());
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.connection.disconnect();
    }

    fn get_json_snapshot(&self) -> Option<T> {
        self.store.load()
    }

    fn on_update(&self, callback: UpdateCallback) -> Subscription {
        self.updates.subscribe(move |()| callback())
    }

    fn get_connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    fn on_connection_state_change(&self, callback: ConnectionCallback) -> Subscription {
        self.connection.subscribe(move |state| callback(state))
    }
}

impl<T> WritableProvider for LocalDocProvider<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    fn save_document_snapshot(&self, snapshot: T) {
        self.store.save(snapshot);
    }
}

impl<T> fmt::Debug for LocalDocProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalDocProvider")
            .field("id", &self.id)
            .field("connection", &self.connection)
            .field("updates", &self.updates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_default_storage_key() {
        let provider: LocalDocProvider = LocalDocProvider::new("t", Arc::new(MemoryStorage::new()));
        assert_eq!(provider.id(), "t");
        assert_eq!(provider.storage_key(), "outliner-t");
        assert_eq!(provider.quiet_period(), Duration::from_millis(800));
        assert_eq!(provider.get_connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_explicit_storage_key() {
        let provider: LocalDocProvider =
            LocalDocProvider::with_storage_key("t", "custom", Arc::new(MemoryStorage::new()));
        assert_eq!(provider.storage_key(), "custom");
    }

    #[test]
    fn test_from_config() {
        let config = OutlinerConfig {
            debounce_ms: 50,
            storage_key_prefix: "doc:".to_string(),
            ..OutlinerConfig::default()
        };
        let provider: LocalDocProvider =
            LocalDocProvider::from_config("a", &config, Arc::new(MemoryStorage::new()));
        assert_eq!(provider.storage_key(), "doc:a");
        assert_eq!(provider.quiet_period(), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_flush_makes_write_visible() {
        let storage = Arc::new(MemoryStorage::new());
        let provider: LocalDocProvider = LocalDocProvider::new("t", storage.clone());

        provider.save_document_snapshot(json!({"a": 1}));
        assert!(provider.has_pending_write());
        assert_eq!(provider.get_json_snapshot(), None);

        provider.flush();
        assert_eq!(provider.get_json_snapshot(), Some(json!({"a": 1})));
        assert_eq!(
            storage.get_item("outliner-t").unwrap(),
            Some("{\"a\":1}".to_string())
        );
    }

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Outline {
        items: Vec<String>,
    }

    #[tokio::test]
    async fn test_typed_snapshot_payload() {
        let provider: LocalDocProvider<Outline> =
            LocalDocProvider::new("typed", Arc::new(MemoryStorage::new()));
        let outline = Outline {
            items: vec!["one".to_string(), "two".to_string()],
        };

        provider.save_document_snapshot(outline.clone());
        provider.flush();
        assert_eq!(provider.get_json_snapshot(), Some(outline));
    }
}
