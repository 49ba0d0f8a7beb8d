//! # Document Providers
//!
//! A provider binds an editor host to a persistence or collaboration backend.
//! The contract is split by capability:
//!
//! - [`DocumentProvider`]: connect/disconnect, snapshot pull, update and
//!   connection-state subscriptions
//! - [`WritableProvider`]: additionally accepts snapshots from the host
//!
//! Hosts that edit require `WritableProvider` at compile time instead of
//! probing for an optional method at runtime.
//!
//! Updates are pull-based: `on_update` callbacks carry no payload and the
//! host re-reads through `get_json_snapshot`. Providers whose change
//! granularity does not map onto a single value (e.g. CRDT merges) only need
//! to say that something changed.

mod local;
mod remote;

pub use local::LocalDocProvider;
pub use remote::RemoteDocProvider;

use async_trait::async_trait;

use crate::connection::ConnectionState;
use crate::errors::ProviderError;
use crate::subscription::Subscription;

/// Default snapshot payload: a JSON-compatible document tree
pub type JsonSnapshot = serde_json::Value;

pub type UpdateCallback = Box<dyn Fn() + Send + Sync>;
pub type ConnectionCallback = Box<dyn Fn(ConnectionState) + Send + Sync>;

#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Opaque document payload
    type Snapshot: Clone + Send + 'static;

    fn id(&self) -> &str;

    /// Establish the session. Already connecting or connected is a no-op.
    ///
    /// On success the state reaches `Connected` and one update notification
    /// follows so hosts can hydrate. On failure the state falls back to
    /// `Disconnected` and the error is returned.
    async fn connect(&self) -> Result<(), ProviderError>;

    /// End in `Disconnected` from any state. Idempotent.
    async fn disconnect(&self);

    /// Last committed snapshot, if any
    fn get_json_snapshot(&self) -> Option<Self::Snapshot>;

    fn on_update(&self, callback: UpdateCallback) -> Subscription;

    fn get_connection_state(&self) -> ConnectionState;

    fn on_connection_state_change(&self, callback: ConnectionCallback) -> Subscription;
}

/// Provider that accepts snapshots from the host
pub trait WritableProvider: DocumentProvider {
    /// Hand a new snapshot to the provider. Persistence happens in the
    /// background; faults are never reported back through this call.
    fn save_document_snapshot(&self, snapshot: Self::Snapshot);
}
