//! # Outliner
//!
//! Document-provider layer for the outliner editor component.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: EditSession (editor host binding)  │
//! │  - mirrors snapshots into local state       │
//! │  - pushes edits back to the provider        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ providers: DocumentProvider contract        │
//! │  - LocalDocProvider (key-value storage)     │
//! │  - RemoteDocProvider (collaboration stub)   │
//! │  - connection state + update fan-out        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ snapshot_store: debounced persistence       │
//! │ storage: injected KeyValueStorage backends  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Pull-based updates**: providers say *that* something changed, hosts
//!    read *what* changed
//! 2. **Debounced writes**: only the last snapshot before a quiet period is
//!    committed
//! 3. **Availability over durability**: persistence faults are absorbed,
//!    connection faults are surfaced
//! 4. **Capabilities in types**: only `WritableProvider` accepts snapshots
//!
//! ## Usage
//!
//! ```rust,no_run
//! use outliner::{DirectoryStorage, EditSession, LocalDocProvider, SessionOptions};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), outliner::ProviderError> {
//! let storage = Arc::new(DirectoryStorage::new(".outliner"));
//! let provider: Arc<LocalDocProvider> = Arc::new(LocalDocProvider::new("demo", storage));
//!
//! let mut session = EditSession::bind(provider.clone(), SessionOptions::default());
//! session.connect().await?;
//! session.edit_text(r#"{"type": "doc", "content": []}"#)?;
//!
//! provider.flush();
//! session.unbind().await;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod connection;
mod errors;
pub mod providers;
pub mod session;
pub mod snapshot_store;
pub mod storage;
pub mod subscription;

pub use commands::{NoopCommands, OutlinerCommand, OutlinerCommands, OutlinerContext};
pub use config::{OutlinerConfig, DEFAULT_CONFIG_NAME};
pub use connection::{ConnectionMachine, ConnectionState};
pub use errors::{ConfigError, PersistError, ProviderError, StorageError};
pub use providers::{DocumentProvider, JsonSnapshot, LocalDocProvider, RemoteDocProvider, WritableProvider};
pub use session::{EditSession, SessionOptions};
pub use snapshot_store::{SnapshotStore, DEFAULT_QUIET_PERIOD};
pub use storage::{DirectoryStorage, KeyValueStorage, MemoryStorage, UnavailableStorage};
pub use subscription::{SubscriberSet, Subscription};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock ignoring poisoning: subscriber panics are caught before they can
/// poison shared state, and every guarded value stays consistent between
/// statements.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
