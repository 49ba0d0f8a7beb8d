//! Collaborative provider placeholder.
//!
//! The shared-document transport does not exist yet, so `connect` always
//! fails with `TransportUnavailable`. Hosts must treat that as a normal,
//! handleable outcome. The connection machine and subscriber sets are real so
//! the contract behaves the same as for every other provider.

use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;

use super::{ConnectionCallback, DocumentProvider, JsonSnapshot, UpdateCallback};
use crate::connection::{ConnectionMachine, ConnectionState};
use crate::errors::ProviderError;
use crate::subscription::{SubscriberSet, Subscription};

pub struct RemoteDocProvider<T = JsonSnapshot> {
    id: String,
    endpoint: Option<String>,
    connection: ConnectionMachine,
    updates: SubscriberSet<()>,
    _snapshot: PhantomData<fn() -> T>,
}

impl<T> RemoteDocProvider<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: None,
            connection: ConnectionMachine::new(),
            updates: SubscriberSet::new(),
            _snapshot: PhantomData,
        }
    }

    /// Collaboration server this provider will talk to
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    async fn open_transport(&self) -> Result<(), ProviderError> {
        let reason = match &self.endpoint {
            Some(endpoint) => format!(
                "remote document transport is not implemented (endpoint {})",
                endpoint
            ),
            None => "remote document transport is not implemented".to_string(),
        };
        Err(ProviderError::TransportUnavailable(reason))
    }
}

#[async_trait]
impl<T> DocumentProvider for RemoteDocProvider<T>
where
    T: Clone + Send + 'static,
{
    type Snapshot = T;

    fn id(&self) -> &str {
        &self.id
    }

    async fn connect(&self) -> Result<(), ProviderError> {
        let Some(attempt) = self.connection.begin_connect() else {
            return Ok(());
        };

        match self.open_transport().await {
            Ok(()) => {
                if self.connection.complete_connect(attempt) {
                    self.updates.notify(());
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "remote provider failed to connect");
                self.connection.fail_connect(attempt);
                Err(e)
            }
        }
    }

    async fn disconnect(&self) {
        self.connection.disconnect();
    }

    fn get_json_snapshot(&self) -> Option<T> {
        None
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

impl<T> fmt::Debug for RemoteDocProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDocProvider")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_reports_endpoint() {
        let provider: RemoteDocProvider = RemoteDocProvider::new("doc").with_endpoint("wss://collab.local");
        let err = provider.connect().await.unwrap_err();

        match err {
            ProviderError::TransportUnavailable(reason) => {
                assert!(reason.contains("wss://collab.local"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(provider.get_connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_snapshot_is_always_absent() {
        let provider: RemoteDocProvider = RemoteDocProvider::new("doc");
        assert_eq!(provider.get_json_snapshot(), None);
        assert_eq!(provider.endpoint(), None);
    }
}
