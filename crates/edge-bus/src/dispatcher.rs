//! # Broadcast Dispatcher
//!
//! Fan-out of one encoded message to every registered subscriber.
//!
//! ## Delivery rules
//!
//! 1. Work from a fresh registry snapshot.
//! 2. A subscriber that is not `Open` is marked and skipped.
//! 3. A send that does not come back `Delivered` marks the subscriber;
//!    delivery to the rest continues.
//! 4. Marked subscribers are unregistered once the pass is over.
//!
//! Failures are never retried and never surface to the caller.

use crate::events::WireMessage;
use crate::metrics::BusMetrics;
use crate::registry::SubscriberRegistry;
use crate::subscriber::{SendOutcome, Subscriber};
use std::sync::Arc;
use tracing::{debug, warn};

/// What a broadcast achieved. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub evicted: usize,
}

pub struct BroadcastDispatcher {
    registry: Arc<SubscriberRegistry>,
    metrics: Arc<BusMetrics>,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<SubscriberRegistry>, metrics: Arc<BusMetrics>) -> Self {
        Self { registry, metrics }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Deliver `message` to every registered subscriber, evicting dead ones.
    pub async fn broadcast(&self, message: &WireMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut dead: Vec<(Subscriber, SendOutcome)> = Vec::new();

        for subscriber in self.registry.list() {
            if !subscriber.is_open() {
                dead.push((subscriber, SendOutcome::Closed));
                continue;
            }
            let outcome = subscriber.send_raw(message).await;
            match outcome {
                SendOutcome::Delivered => report.delivered += 1,
                failed => dead.push((subscriber, failed)),
            }
        }

        for (subscriber, outcome) in &dead {
            if self.registry.unregister(subscriber) {
                report.evicted += 1;
                debug!(
                    subscriber_id = %subscriber.id(),
                    event_type = %message.event_type(),
                    outcome = %outcome,
                    "Evicted subscriber during broadcast"
                );
            }
        }

        self.metrics
            .record_broadcast(report.delivered as u64, report.evicted as u64);
        debug!(
            event_type = %message.event_type(),
            delivered = report.delivered,
            evicted = report.evicted,
            "Broadcast complete"
        );
        report
    }

    /// Deliver `message` to a single subscriber.
    ///
    /// A subscriber that is not open gets nothing and `Closed` comes back;
    /// the caller decides what that means for its own loop.
    pub async fn send_one(&self, subscriber: &Subscriber, message: &WireMessage) -> SendOutcome {
        if !subscriber.is_open() {
            return SendOutcome::Closed;
        }
        let outcome = subscriber.send_raw(message).await;
        match &outcome {
            SendOutcome::Delivered => self.metrics.record_delivery(),
            SendOutcome::Closed => {}
            SendOutcome::TransportError(reason) => warn!(
                subscriber_id = %subscriber.id(),
                event_type = %message.event_type(),
                reason = %reason,
                "Send failed"
            ),
        }
        outcome
    }
}
