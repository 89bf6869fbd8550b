//! Event bus for cross-cutting notifications.
//!
//! Components publish state changes (circuit transitions, cache evictions)
//! into a broadcast channel. Publishing never blocks and never affects
//! request control flow; subscribers that fall behind simply miss events.

use tokio::sync::broadcast;

/// Default capacity of the broadcast channel
const DEFAULT_CAPACITY: usize = 64;

/// Why cache entries were evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Entries passed their expiry time
    Expired,
    /// Entry count exceeded the configured maximum
    Capacity,
    /// Estimated memory footprint exceeded the configured maximum
    Memory,
}

/// Notification published by bridge components
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// The circuit breaker tripped open
    CircuitOpened {
        /// The protected service
        service: String,
    },
    /// The circuit breaker is probing the upstream
    CircuitHalfOpen {
        /// The protected service
        service: String,
    },
    /// The circuit breaker recovered
    CircuitClosed {
        /// The protected service
        service: String,
    },
    /// The cache evicted entries
    CacheEvicted {
        /// Why the entries were evicted
        reason: EvictionReason,
        /// How many entries were removed
        count: usize,
    },
}

/// Broadcast bus for bridge events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BridgeEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers
    ///
    /// A send with no subscribers is not an error.
    pub fn publish(&self, event: BridgeEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
