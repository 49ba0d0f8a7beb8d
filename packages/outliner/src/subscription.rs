//! # Subscriber Fan-out
//!
//! Callback sets shared by every provider for update and connection events.
//!
//! Delivery rules:
//! - Callbacks run synchronously inside the operation that triggers them
//! - No lock is held while a callback runs, so callbacks may call back into
//!   the provider (e.g. pull a snapshot from an update notification)
//! - Each invocation is isolated: a panicking subscriber is logged and the
//!   remaining subscribers still receive the event
//! - A callback removed mid-delivery is not invoked for that event

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use crate::lock;

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

struct Entry<A> {
    id: u64,
    callback: Callback<A>,
}

struct Registry<A> {
    next_id: u64,
    entries: Vec<Entry<A>>,
}

/// Identity-keyed set of subscriber callbacks receiving values of type `A`
pub struct SubscriberSet<A> {
    registry: Arc<Mutex<Registry<A>>>,
}

impl<A: Clone + 'static> SubscriberSet<A> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback. The returned token removes exactly this callback.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry {
                id,
                callback: Arc::new(callback),
            });
            id
        };

        let registry: Weak<Mutex<Registry<A>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Deliver `value` to every current subscriber. Returns how many callbacks ran.
    pub fn notify(&self, value: A) -> usize {
        let ids: Vec<u64> = lock(&self.registry)
            .entries
            .iter()
            .map(|entry| entry.id)
            .collect();

        let mut delivered = 0;
        for id in ids {
            let callback = lock(&self.registry)
                .entries
                .iter()
                .find(|entry| entry.id == id)
                .map(|entry| entry.callback.clone());

            let Some(callback) = callback else {
                continue;
            };

            let arg = value.clone();
            if catch_unwind(AssertUnwindSafe(|| callback(arg))).is_err() {
                tracing::error!(subscriber = id, "subscriber panicked during notification");
            }
            delivered += 1;
        }
        delivered
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Clone + 'static> Default for SubscriberSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for SubscriberSet<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("subscribers", &lock(&self.registry).entries.len())
            .finish()
    }
}

/// Unsubscribe token returned by `subscribe`.
///
/// Dropping the token leaves the callback registered; call
/// [`Subscription::unsubscribe`] to remove it. Unsubscribing twice is a no-op.
pub struct Subscription {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    pub fn unsubscribe(&self) {
        let cancel = lock(&self.cancel).take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether `unsubscribe` has already run
    pub fn is_active(&self) -> bool {
        lock(&self.cancel).is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
