//! # Lifecycle Event Publisher
//!
//! Synchronous fan-out publisher for lifecycle events. Publishing never
//! blocks control flow: events sent to a full subscriber are dropped with a
//! warning, disconnected subscribers are pruned, and publishing with no
//! subscribers at all is perfectly acceptable.

use std::sync::Arc;

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::constants::DEFAULT_EVENT_CAPACITY;

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Lifecycle event publisher with bounded per-subscriber channels.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    inner: Arc<PublisherInner>,
}

#[derive(Debug)]
struct PublisherInner {
    capacity: usize,
    subscribers: RwLock<Vec<Sender<PublishedEvent>>>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified per-subscriber
    /// channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                capacity,
                subscribers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Publish an event with the given name and context.
    pub fn publish(&self, event_name: impl Into<String>, context: Value) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        let mut subscribers = self.inner.subscribers.write();
        subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                // A slow subscriber must not stall lifecycle processing.
                warn!(event = %dropped.name, "subscriber channel full; dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        Ok(())
    }

    /// Serialize an arbitrary payload and publish it as the event context.
    pub fn publish_payload<T: Serialize>(
        &self,
        event_name: impl Into<String>,
        payload: &T,
    ) -> Result<(), PublishError> {
        let context = serde_json::to_value(payload)?;
        self.publish(event_name, context)
    }

    /// Subscribe to events published from this point on.
    pub fn subscribe(&self) -> Receiver<PublishedEvent> {
        let (sender, receiver) = bounded(self.inner.capacity);
        self.inner.subscribers.write().push(sender);
        receiver
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
