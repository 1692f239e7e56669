//! Subscriber registry: the single source of truth for who is reachable.

use crate::subscriber::{Subscriber, SubscriberId};
use dashmap::DashMap;
use tracing::debug;

/// Concurrent set of connected subscribers, keyed by id.
///
/// Register/unregister may race with iteration; [`list`](Self::list)
/// returns an owned snapshot so callers never hold shard locks while
/// awaiting a send.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: DashMap<SubscriberId, Subscriber>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Registering the same connection twice keeps one entry.
    pub fn register(&self, subscriber: Subscriber) {
        let id = subscriber.id();
        if self.subscribers.insert(id, subscriber).is_none() {
            debug!(subscriber_id = %id, total = self.subscribers.len(), "Registered subscriber");
        }
    }

    /// Remove a subscriber. Absent subscribers are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn unregister(&self, subscriber: &Subscriber) -> bool {
        self.unregister_id(&subscriber.id())
    }

    pub fn unregister_id(&self, id: &SubscriberId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        if removed {
            debug!(subscriber_id = %id, total = self.subscribers.len(), "Unregistered subscriber");
        }
        removed
    }

    /// Point-in-time snapshot of the registered subscribers, in no particular order.
    pub fn list(&self) -> Vec<Subscriber> {
        self.subscribers.iter().map(|e| e.value().clone()).collect()
    }

    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.subscribers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
