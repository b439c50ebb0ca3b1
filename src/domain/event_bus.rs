//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. Every committed
//! registry mutation publishes a [`PoolEvent`] through the bus; WebSocket
//! connections and the persistence event log subscribe to it.

use tokio::sync::broadcast;

use super::PoolEvent;

/// Fan-out of committed registry events.
///
/// Slow receivers lose the oldest events once `capacity` is exceeded and
/// observe `RecvError::Lagged`; publishers never block.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per receiver.
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publishes an event and returns how many receivers got it. With no
    /// receivers the event is dropped.
    pub fn publish(&self, event: PoolEvent) -> usize {
        let event_type = event.event_type_str();
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(event_type, delivered, "event published");
        delivered
    }

    /// Receiver for all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-receiver buffer size.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
