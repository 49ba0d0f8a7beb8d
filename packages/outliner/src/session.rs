//! # Edit Session
//!
//! Binds one editor host to one document provider.
//!
//! An EditSession mirrors the provider's snapshot into local editable state
//! and pushes local edits back. Local state and persisted state may diverge
//! while a write sits in the provider's quiet period: edits reach the change
//! listener immediately, persistence catches up later.
//!
//! ```text
//! bind ──▶ pull snapshot ──▶ local value ◀── edit()
//!              ▲                  │             │
//!          on_update          on_change   save_document_snapshot
//! ```

use serde_json::Value;
use std::sync::{Arc, Mutex, Weak};

use crate::commands::{NoopCommands, OutlinerContext};
use crate::config::OutlinerConfig;
use crate::connection::ConnectionState;
use crate::errors::ProviderError;
use crate::lock;
use crate::providers::{DocumentProvider, WritableProvider};
use crate::subscription::Subscription;

/// Listener receiving every value the session surfaces
pub type ChangeListener<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct SessionOptions<T> {
    /// Local value shown before any snapshot is pulled
    pub initial_doc: Option<T>,
    pub on_change: Option<ChangeListener<T>>,
    pub read_only: bool,
    pub max_depth: u32,
}

impl<T> SessionOptions<T> {
    pub fn from_config(config: &OutlinerConfig) -> Self {
        Self {
            initial_doc: None,
            on_change: None,
            read_only: config.read_only,
            max_depth: config.max_depth,
        }
    }

    pub fn with_initial_doc(mut self, doc: T) -> Self {
        self.initial_doc = Some(doc);
        self
    }

    pub fn with_on_change<F>(mut self, listener: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(listener));
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

impl<T> Default for SessionOptions<T> {
    fn default() -> Self {
        Self::from_config(&OutlinerConfig::default())
    }
}

struct SessionState<T> {
    value: Option<T>,
    connection_state: ConnectionState,
}

/// Single editor host bound to a provider
pub struct EditSession<P: DocumentProvider> {
    provider: Arc<P>,
    state: Arc<Mutex<SessionState<P::Snapshot>>>,
    on_change: Option<ChangeListener<P::Snapshot>>,
    read_only: bool,
    max_depth: u32,
    commands: NoopCommands,
    connection_sub: Subscription,
    update_sub: Subscription,
    bound: bool,
}

impl<P: DocumentProvider + 'static> EditSession<P> {
    /// Bind to `provider`: capture its connection state, subscribe to both
    /// event streams and hydrate from the current snapshot.
    ///
    /// Binding does not connect; call [`EditSession::connect`].
    pub fn bind(provider: Arc<P>, options: SessionOptions<P::Snapshot>) -> Self {
        let state = Arc::new(Mutex::new(SessionState {
            value: options.initial_doc,
            connection_state: provider.get_connection_state(),
        }));

        let connection_sub = {
            let state = Arc::clone(&state);
            provider.on_connection_state_change(Box::new(move |next| {
                lock(&state).connection_state = next;
            }))
        };

        pull_snapshot(&*provider, &state, options.on_change.as_ref());

        let update_sub = {
            // Weak: the provider owns this callback
            let provider_ref: Weak<P> = Arc::downgrade(&provider);
            let state = Arc::clone(&state);
            let on_change = options.on_change.clone();
            provider.on_update(Box::new(move || {
                if let Some(provider) = provider_ref.upgrade() {
                    pull_snapshot(&*provider, &state, on_change.as_ref());
                }
            }))
        };

        tracing::debug!(provider = provider.id(), "edit session bound");

        Self {
            provider,
            state,
            on_change: options.on_change,
            read_only: options.read_only,
            max_depth: options.max_depth,
            commands: NoopCommands,
            connection_sub,
            update_sub,
            bound: true,
        }
    }

    /// Connect the provider. A failure leaves the session `Disconnected` and is
    /// returned to the caller.
    pub async fn connect(&self) -> Result<(), ProviderError> {
        match self.provider.connect().await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(provider = self.provider.id(), error = %e, "provider connect failed");
                lock(&self.state).connection_state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Unsubscribe from the provider and disconnect it. Safe to call more
    /// than once and when `connect` never completed.
    pub async fn unbind(&mut self) {
        if !self.bound {
            return;
        }
        self.bound = false;

        self.connection_sub.unsubscribe();
        self.update_sub.unsubscribe();
        self.provider.disconnect().await;

        tracing::debug!(provider = self.provider.id(), "edit session unbound");
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Current local value
    pub fn value(&self) -> Option<P::Snapshot> {
        lock(&self.state).value.clone()
    }

    /// Connection state as last observed by this session
    pub fn connection_state(&self) -> ConnectionState {
        lock(&self.state).connection_state
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn context(&self) -> OutlinerContext<'_> {
        OutlinerContext {
            provider_id: self.provider.id(),
            commands: &self.commands,
            connection_state: self.connection_state(),
            read_only: self.read_only,
            max_depth: self.max_depth,
        }
    }
}

impl<P: WritableProvider + 'static> EditSession<P> {
    /// Apply a local edit: update local state, hand the value to the provider
    /// and surface it to the change listener before persistence commits.
    pub fn edit(&self, value: P::Snapshot) -> Result<(), ProviderError> {
        if self.read_only {
            return Err(ProviderError::ReadOnly);
        }

        lock(&self.state).value = Some(value.clone());
        self.provider.save_document_snapshot(value.clone());

        if let Some(listener) = &self.on_change {
            listener(&value);
        }
        Ok(())
    }
}

impl<P> EditSession<P>
where
    P: WritableProvider<Snapshot = Value> + 'static,
{
    /// Edit from raw text: valid JSON is stored as parsed, anything else is
    /// kept as a JSON string.
    pub fn edit_text(&self, text: &str) -> Result<(), ProviderError> {
        let value = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        self.edit(value)
    }
}

impl<P> EditSession<P>
where
    P: DocumentProvider<Snapshot = Value> + 'static,
{
    /// Textual mirror of the local value: strings verbatim, everything else
    /// as pretty-printed JSON.
    pub fn render_text(&self) -> String {
        match self.value() {
            Some(Value::String(text)) => text,
            Some(value) => serde_json::to_string_pretty(&value).unwrap_or_default(),
            None => "{}".to_string(),
        }
    }
}

impl<P: DocumentProvider> Drop for EditSession<P> {
    fn drop(&mut self) {
        self.connection_sub.unsubscribe();
        self.update_sub.unsubscribe();
    }
}

fn pull_snapshot<P: DocumentProvider + ?Sized>(
    provider: &P,
    state: &Mutex<SessionState<P::Snapshot>>,
    on_change: Option<&ChangeListener<P::Snapshot>>,
) {
    let Some(snapshot) = provider.get_json_snapshot() else {
        return;
    };

    lock(state).value = Some(snapshot.clone());

    if let Some(listener) = on_change {
        listener(&snapshot);
    }
}
