//! Event bus implementation using tokio broadcast channels

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::types::EventEnvelope;

/// Capacity for the broadcast channel
const DEFAULT_CAPACITY: usize = 256;

/// Event bus for publishing and subscribing to events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    /// Number of events published (for monitoring)
    published: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of subscribers that received the event.
    /// With no subscribers the event is dropped and 0 is returned.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the total number of events published
    pub fn published_count(&self) -> usize {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("published_count", &self.published_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use uuid::Uuid;
    use wharf_core::RunState;

    fn state_event() -> Event {
        Event::ServerStateChanged {
            server_id: Uuid::new_v4(),
            state: RunState::Started,
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let envelope = EventEnvelope::new(state_event());
        let sent = bus.publish(envelope.clone());
        assert_eq!(sent, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, envelope.id);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let envelope = EventEnvelope::new(state_event());
        let envelope_id = envelope.id;

        let sent = bus.publish(envelope);
        assert_eq!(sent, 2);

        assert_eq!(rx1.recv().await.unwrap().id, envelope_id);
        assert_eq!(rx2.recv().await.unwrap().id, envelope_id);
    }

    #[tokio::test]
    async fn test_no_subscribers_drops_event() {
        let bus = EventBus::new();
        let sent = bus.publish(EventEnvelope::new(state_event()));
        assert_eq!(sent, 0);
    }

    #[tokio::test]
    async fn test_published_count() {
        let bus = EventBus::new();
        assert_eq!(bus.published_count(), 0);

        bus.publish(EventEnvelope::new(state_event()));
        bus.publish(EventEnvelope::new(state_event()));
        assert_eq!(bus.published_count(), 2);
    }

    #[test]
    fn test_clone_shares_channel() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let _rx = bus2.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);
    }
}
