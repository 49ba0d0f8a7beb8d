//! # Debounced Snapshot Store
//!
//! Buffers rapid successive snapshot writes and commits only the last one
//! after a quiet period, so per-keystroke saves do not turn into
//! per-keystroke storage I/O.
//!
//! ## Timeline
//!
//! ```text
//! save(v1)   save(v2)                     commit(v2)
//!    │──────────│────────── quiet ───────────│
//!    t0       t0+δ                      t0+δ+800ms
//! ```
//!
//! - Each `save` replaces the pending value and restarts the timer
//! - `load` returns the last *committed* value, never a pending one whose
//!   deadline has not passed
//! - A pending write whose deadline has passed is committed before `load`
//!   reads, so the result does not depend on when the timer task gets polled
//! - Serialization and storage faults are absorbed: logged, handed to
//!   `on_persist_error` observers, never returned

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::errors::PersistError;
use crate::lock;
use crate::storage::KeyValueStorage;
use crate::subscription::{SubscriberSet, Subscription};

/// Quiet period applied when none is configured
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(800);

struct PendingWrite<T> {
    value: T,
    deadline: Instant,
    generation: u64,
}

struct WriteState<T> {
    pending: Option<PendingWrite<T>>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared<T> {
    key: String,
    storage: Arc<dyn KeyValueStorage>,
    quiet_period: Duration,
    state: Mutex<WriteState<T>>,
    // Serializes take+write so an older value can never land after a newer one
    write_lock: Mutex<()>,
    error_observers: SubscriberSet<Arc<PersistError>>,
}

/// Debounced persistence of snapshots of type `T` under a single storage key
pub struct SnapshotStore<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SnapshotStore<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(key: impl Into<String>, storage: Arc<dyn KeyValueStorage>, quiet_period: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                key: key.into(),
                storage,
                quiet_period,
                state: Mutex::new(WriteState {
                    pending: None,
                    generation: 0,
                    timer: None,
                }),
                write_lock: Mutex::new(()),
                error_observers: SubscriberSet::new(),
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.shared.key
    }

    pub fn quiet_period(&self) -> Duration {
        self.shared.quiet_period
    }

    /// Record `snapshot` as the pending value and restart the quiet period.
    /// Any earlier pending value is discarded without being committed.
    pub fn save(&self, snapshot: T) {
        let deadline = Instant::now() + self.shared.quiet_period;

        let mut state = lock(&self.shared.state);
        state.generation += 1;
        let generation = state.generation;

        if let Some(previous) = state.pending.take() {
            tracing::trace!(
                key = %self.shared.key,
                superseded = previous.generation,
                "coalescing pending snapshot write"
            );
        }
        state.pending = Some(PendingWrite {
            value: snapshot,
            deadline,
            generation,
        });

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.timer = self.spawn_timer(deadline, generation);

        tracing::debug!(
            key = %self.shared.key,
            generation,
            quiet_ms = self.shared.quiet_period.as_millis() as u64,
            "snapshot write scheduled"
        );
    }

    /// Read the last committed snapshot.
    ///
    /// Returns `None` when nothing has been committed, the stored text is not
    /// valid for `T`, or the storage cannot be read.
    pub fn load(&self) -> Option<T> {
        self.shared.commit_if(|pending| pending.deadline <= Instant::now());
        self.shared.read()
    }

    /// Commit the pending write now, ignoring the quiet period.
    /// Returns whether there was anything to commit.
    pub fn flush(&self) -> bool {
        self.shared.commit_if(|_| true)
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.shared.state).pending.is_some()
    }

    /// Drop any pending write and remove the committed entry
    pub fn clear(&self) {
        let _guard = lock(&self.shared.write_lock);
        {
            let mut state = lock(&self.shared.state);
            state.pending = None;
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
        if let Err(e) = self.shared.storage.remove_item(&self.shared.key) {
            tracing::warn!(key = %self.shared.key, error = %e, "failed to clear snapshot");
        }
    }

    /// Observe writes that were dropped because of a fault.
    ///
    /// Faults are still absorbed; observers only get to see them.
    pub fn on_persist_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Arc<PersistError>) + Send + Sync + 'static,
    {
        self.shared.error_observers.subscribe(callback)
    }

    fn spawn_timer(&self, deadline: Instant, generation: u64) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::debug!(
                    key = %self.shared.key,
                    "no tokio runtime; snapshot will be committed on next load or flush"
                );
                return None;
            }
        };

        let shared = Arc::clone(&self.shared);
        Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            shared.commit_if(|pending| pending.generation == generation);
        }))
    }
}

impl<T> Shared<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn commit_if<P>(&self, predicate: P) -> bool
    where
        P: FnOnce(&PendingWrite<T>) -> bool,
    {
        let outcome = {
            let _guard = lock(&self.write_lock);

            let pending = {
                let mut state = lock(&self.state);
                if !state.pending.as_ref().map_or(false, predicate) {
                    return false;
                }
                // Detach rather than abort: this may be the timer task itself
                state.timer = None;
                state.pending.take()
            };

            match pending {
                Some(pending) => self.write(pending),
                None => return false,
            }
        };

        if let Err(e) = outcome {
            tracing::warn!(key = %self.key, error = %e, "discarding snapshot write");
            self.error_observers.notify(Arc::new(e));
        }
        true
    }

    fn write(&self, pending: PendingWrite<T>) -> Result<(), PersistError> {
        let json = serde_json::to_string(&pending.value).map_err(|source| PersistError::Serialize {
            key: self.key.clone(),
            source,
        })?;

        self.storage
            .set_item(&self.key, &json)
            .map_err(|source| PersistError::Storage {
                key: self.key.clone(),
                source,
            })?;

        tracing::debug!(
            key = %self.key,
            generation = pending.generation,
            bytes = json.len(),
            "snapshot committed"
        );
        Ok(())
    }

    fn read(&self) -> Option<T> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "snapshot storage unreadable");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "ignoring corrupt snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, UnavailableStorage};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn store(storage: Arc<MemoryStorage>) -> SnapshotStore<Value> {
        SnapshotStore::new("outliner-t", storage, DEFAULT_QUIET_PERIOD)
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_before_quiet_period_sees_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store(storage.clone());

        store.save(json!({"a": 1}));
        store.save(json!({"a": 2}));

        tokio::time::advance(Duration::from_millis(799)).await;
        assert_eq!(store.load(), None);
        assert!(store.has_pending());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(store.load(), Some(json!({"a": 2})));
        assert!(!store.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_commits_without_a_read() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store(storage.clone());

        store.save(json!({"a": 1}));
        tokio::time::sleep(Duration::from_millis(850)).await;

        assert_eq!(
            storage.get_item("outliner-t").unwrap(),
            Some("{\"a\":1}".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_save_restarts_the_quiet_period() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store(storage.clone());

        store.save(json!(1));
        tokio::time::advance(Duration::from_millis(500)).await;
        store.save(json!(2));
        tokio::time::advance(Duration::from_millis(500)).await;

        // 1000ms since the first save, only 500ms since the last one
        assert_eq!(store.load(), None);

        tokio::time::advance(Duration::from_millis(300)).await;
        assert_eq!(store.load(), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_during_window_sees_previous_commit() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store(storage.clone());

        store.save(json!("first"));
        store.flush();
        store.save(json!("second"));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(store.load(), Some(json!("first")));
    }

    #[test]
    fn test_without_runtime_write_stays_pending_until_flush() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store(storage.clone());

        store.save(json!({"offline": true}));
        assert!(store.has_pending());
        assert!(storage.is_empty());

        assert!(store.flush());
        assert!(!store.flush());
        assert_eq!(store.load(), Some(json!({"offline": true})));
    }

    #[test]
    fn test_corrupt_snapshot_reads_as_none() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("outliner-t", "{not json").unwrap();
        assert_eq!(store(storage).load(), None);
    }

    #[test]
    fn test_storage_fault_is_absorbed_and_observed() {
        let store: SnapshotStore<Value> =
            SnapshotStore::new("outliner-x", Arc::new(UnavailableStorage), DEFAULT_QUIET_PERIOD);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        store.on_persist_error(move |e| lock(&seen2).push(e.key().to_string()));

        store.save(json!({"lost": true}));
        assert!(store.flush());

        assert_eq!(store.load(), None);
        assert_eq!(*lock(&seen), vec!["outliner-x".to_string()]);
    }

    #[test]
    fn test_unserializable_snapshot_is_dropped_and_observed() {
        // JSON object keys must be strings, so tuple keys cannot be written
        type Grid = HashMap<(u8, u8), u8>;

        let storage = Arc::new(MemoryStorage::new());
        let store: SnapshotStore<Grid> =
            SnapshotStore::new("outliner-grid", storage.clone(), DEFAULT_QUIET_PERIOD);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        store.on_persist_error(move |e| {
            lock(&seen2).push(matches!(*e, PersistError::Serialize { .. }));
        });

        let bad: Grid = HashMap::from([((0, 0), 1)]);
        store.save(bad.clone());
        assert!(store.flush());
        assert_eq!(store.load(), None);
        assert!(storage.is_empty());

        store.save(Grid::new());
        store.flush();
        store.save(bad);
        store.flush();

        assert_eq!(store.load(), Some(Grid::new()));
        assert_eq!(storage.get_item("outliner-grid").unwrap(), Some("{}".to_string()));
        assert_eq!(*lock(&seen), vec![true, true]);
    }

    #[test]
    fn test_clear_drops_pending_and_committed() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store(storage.clone());

        store.save(json!(1));
        store.flush();
        store.save(json!(2));
        store.clear();

        assert!(!store.has_pending());
        assert_eq!(store.load(), None);
        assert!(storage.is_empty());
    }
}
