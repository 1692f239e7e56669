//! # Notification Hub
//!
//! The collaborator the REST layer talks to. It owns one registry, one
//! encoder, one dispatcher and a publisher handle per connected subscriber.
//!
//! ```text
//! REST handler ──notify──→ EventEncoder ──→ BroadcastDispatcher ──→ subscribers
//! WS connect   ──on_subscriber_connected──→ register + spawn PeriodicPublisher
//! WS close     ──on_subscriber_disconnected──→ cancel publisher + unregister
//! ```
//!
//! `notify` never fails from the caller's point of view: encoding problems
//! are logged and counted, delivery problems evict the subscriber.

use crate::dispatcher::{BroadcastDispatcher, BroadcastReport};
use crate::events::{EventEncoder, EventType};
use crate::generator::{MetricGenerator, RandomMetricGenerator};
use crate::metrics::BusMetrics;
use crate::publisher::{OnlineNodeSource, PeriodicPublisher, PublisherContext, PublisherHandle};
use crate::registry::SubscriberRegistry;
use crate::subscriber::{Subscriber, SubscriberChannel, SubscriberId};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default interval between synthetic metric pushes.
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(5);

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub publish_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}

pub struct NotificationHub {
    registry: Arc<SubscriberRegistry>,
    publishers: DashMap<SubscriberId, PublisherHandle>,
    context: PublisherContext,
}

impl NotificationHub {
    /// Build a hub with random metric generation.
    pub fn new(config: HubConfig, source: Arc<dyn OnlineNodeSource>) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        let metrics = Arc::new(BusMetrics::new());
        let dispatcher = Arc::new(BroadcastDispatcher::new(registry.clone(), metrics.clone()));
        Self {
            registry,
            publishers: DashMap::new(),
            context: PublisherContext {
                dispatcher,
                encoder: Arc::new(EventEncoder::new()),
                source,
                generator: Arc::new(RandomMetricGenerator::new()),
                metrics,
                interval: config.publish_interval,
            },
        }
    }

    /// Replace the metric generator used by publishers spawned from now on.
    pub fn with_generator(mut self, generator: Arc<dyn MetricGenerator>) -> Self {
        self.context.generator = generator;
        self
    }

    /// Encode and broadcast one event.
    ///
    /// Returns `None` if the payload could not be encoded.
    pub async fn notify<T>(&self, event_type: EventType, payload: &T) -> Option<BroadcastReport>
    where
        T: Serialize + Sync + ?Sized,
    {
        match self.context.encoder.encode(event_type, payload) {
            Ok(message) => {
                let report = self.context.dispatcher.broadcast(&message).await;
                if report.evicted > 0 {
                    self.prune_publishers();
                }
                Some(report)
            }
            Err(e) => {
                self.context.metrics.record_encode_failure();
                error!(event_type = %event_type, error = %e, "Failed to encode notification");
                None
            }
        }
    }

    pub async fn notify_node_deleted(&self, node_id: &str) -> Option<BroadcastReport> {
        self.notify(EventType::NodeDeleted, node_id).await
    }

    /// Register a freshly opened channel and start its publisher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_subscriber_connected(&self, channel: Arc<dyn SubscriberChannel>) -> Subscriber {
        self.prune_publishers();
        let subscriber = Subscriber::new(channel);
        self.registry.register(subscriber.clone());
        self.context.metrics.record_connect();

        let handle = PeriodicPublisher::new(subscriber.clone(), self.context.clone()).spawn();
        self.publishers.insert(subscriber.id(), handle);

        info!(
            subscriber_id = %subscriber.id(),
            subscribers = self.registry.len(),
            "Subscriber connected"
        );
        subscriber
    }

    /// Stop the subscriber's publisher and drop it from the registry.
    ///
    /// Safe to call more than once.
    pub async fn on_subscriber_disconnected(&self, subscriber: &Subscriber) {
        let handle = self.publishers.remove(&subscriber.id()).map(|(_, h)| h);
        if let Some(handle) = handle {
            handle.shutdown().await;
            self.context.metrics.record_disconnect();
        }
        self.registry.unregister(subscriber);

        info!(
            subscriber_id = %subscriber.id(),
            subscribers = self.registry.len(),
            "Subscriber disconnected"
        );
    }

    /// Drop publisher handles whose subscriber has left the registry.
    ///
    /// Covers subscribers evicted by a broadcast and publishers that ended
    /// on their own; both unregister without going through the transport.
    fn prune_publishers(&self) {
        let registry = &self.registry;
        let metrics = &self.context.metrics;
        self.publishers.retain(|id, handle| {
            if registry.contains(id) && !handle.is_finished() {
                return true;
            }
            handle.cancel();
            metrics.record_disconnect();
            debug!(subscriber_id = %id, "Pruned publisher of departed subscriber");
            false
        });
    }

    /// Cancel every running publisher. Used on service shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<SubscriberId> = self.publishers.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, handle)) = self.publishers.remove(&id) {
                handle.shutdown().await;
                self.context.metrics.record_disconnect();
            }
            self.registry.unregister_id(&id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn publisher_count(&self) -> usize {
        self.publishers.len()
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> Arc<BusMetrics> {
        self.context.metrics.clone()
    }
}
