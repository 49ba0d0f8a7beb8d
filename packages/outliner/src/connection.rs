//! # Connection State Machine
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──complete──▶ Connected
//!      ▲                        │                        │
//!      └────────fail────────────┘                        │
//!      └──────────────────────disconnect─────────────────┘
//! ```
//!
//! Transitions are driven by the owning provider only. Every connect attempt
//! carries an epoch; `disconnect` bumps the epoch so a transport that finishes
//! after the host gave up cannot move the machine back to `Connected`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

use crate::lock;
use crate::subscription::{SubscriberSet, Subscription};

/// Availability of a provider toward its backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket for one in-flight connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectAttempt {
    epoch: u64,
}

#[derive(Debug)]
struct MachineState {
    current: ConnectionState,
    epoch: u64,
}

/// Connection state owned by a single provider instance
#[derive(Debug)]
pub struct ConnectionMachine {
    state: Mutex<MachineState>,
    subscribers: SubscriberSet<ConnectionState>,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MachineState {
                current: ConnectionState::Disconnected,
                epoch: 0,
            }),
            subscribers: SubscriberSet::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.state).current
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Move to `Connecting`. Returns `None` if already connecting or connected.
    pub fn begin_connect(&self) -> Option<ConnectAttempt> {
        let attempt = {
            let mut state = lock(&self.state);
            if state.current != ConnectionState::Disconnected {
                return None;
            }
            state.epoch += 1;
            state.current = ConnectionState::Connecting;
            ConnectAttempt { epoch: state.epoch }
        };
        self.announce(ConnectionState::Connecting);
        Some(attempt)
    }

    /// Finish `attempt` successfully. Returns `false` if the attempt was
    /// superseded by a disconnect, in which case the state is left alone.
    pub fn complete_connect(&self, attempt: ConnectAttempt) -> bool {
        self.settle(attempt, ConnectionState::Connected)
    }

    /// Abandon `attempt`, falling back to `Disconnected`.
    pub fn fail_connect(&self, attempt: ConnectAttempt) -> bool {
        self.settle(attempt, ConnectionState::Disconnected)
    }

    /// Unconditionally end in `Disconnected`. Returns whether the state changed.
    pub fn disconnect(&self) -> bool {
        {
            let mut state = lock(&self.state);
            state.epoch += 1;
            if state.current == ConnectionState::Disconnected {
                return false;
            }
            state.current = ConnectionState::Disconnected;
        }
        self.announce(ConnectionState::Disconnected);
        true
    }

    fn settle(&self, attempt: ConnectAttempt, next: ConnectionState) -> bool {
        {
            let mut state = lock(&self.state);
            if state.epoch != attempt.epoch || state.current != ConnectionState::Connecting {
                tracing::debug!(
                    attempt = attempt.epoch,
                    current = state.epoch,
                    "ignoring stale connect attempt"
                );
                return false;
            }
            state.current = next;
        }
        self.announce(next);
        true
    }

    fn announce(&self, next: ConnectionState) {
        tracing::debug!(state = %next, "connection state changed");
        self.subscribers.notify(next);
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(machine: &ConnectionMachine) -> Arc<Mutex<Vec<ConnectionState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        machine.subscribe(move |state| lock(&seen2).push(state));
        seen
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let machine = ConnectionMachine::new();
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_full_lifecycle_notifies_each_transition() {
        let machine = ConnectionMachine::new();
        let seen = record(&machine);

        let attempt = machine.begin_connect().unwrap();
        assert!(machine.complete_connect(attempt));
        assert!(machine.disconnect());

        assert_eq!(
            *lock(&seen),
            vec![
                ConnectionState::Connecting,
                ConnectionState::Connected,
                ConnectionState::Disconnected,
            ]
        );
    }

    #[test]
    fn test_begin_connect_while_connected_is_noop() {
        let machine = ConnectionMachine::new();
        let attempt = machine.begin_connect().unwrap();
        machine.complete_connect(attempt);

        assert!(machine.begin_connect().is_none());
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_disconnect_is_idempotent_and_silent_when_already_down() {
        let machine = ConnectionMachine::new();
        let seen = record(&machine);

        assert!(!machine.disconnect());
        assert!(!machine.disconnect());
        assert!(lock(&seen).is_empty());
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_during_connect_wins() {
        let machine = ConnectionMachine::new();
        let attempt = machine.begin_connect().unwrap();

        machine.disconnect();
        assert!(!machine.complete_connect(attempt));
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_failed_connect_returns_to_disconnected() {
        let machine = ConnectionMachine::new();
        let seen = record(&machine);

        let attempt = machine.begin_connect().unwrap();
        assert!(machine.fail_connect(attempt));

        assert_eq!(machine.state(), ConnectionState::Disconnected);
        assert_eq!(
            *lock(&seen),
            vec![ConnectionState::Connecting, ConnectionState::Disconnected]
        );
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }
}
