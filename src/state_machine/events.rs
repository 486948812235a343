//! # State Change Notifications
//!
//! Listener registration and dispatch for state machine transitions.
//! Listener failures are logged and never allowed to break the machine.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

/// A successful transition, reported as the pair of state names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub from: String,
    pub to: String,
}

impl StateChange {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Observer of state machine transitions.
pub trait StateChangeListener: Send + Sync {
    /// Called after every committed transition.
    fn state_changed(
        &self,
        change: &StateChange,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Thread-safe listener collection with failure-isolating dispatch.
#[derive(Clone, Default)]
pub struct ListenerSet {
    listeners: Arc<RwLock<Vec<Arc<dyn StateChangeListener>>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn StateChangeListener>) {
        self.listeners.write().push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Notify every registered listener; a failing listener is logged and
    /// does not prevent the remaining listeners from being notified.
    pub fn notify(&self, change: &StateChange) {
        let snapshot: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in snapshot {
            if let Err(error) = listener.state_changed(change) {
                warn!(
                    from = %change.from,
                    to = %change.to,
                    error = %error,
                    "state change listener failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("listeners", &self.len())
            .finish()
    }
}
