//! # Periodic Publisher
//!
//! One background task per connected subscriber, pushing synthetic
//! `metrics_update` events for every online node on a fixed interval.
//!
//! ```text
//! Init ──→ Loop ──(cancelled | send not delivered)──→ Terminal
//!           │ ▲
//!           └─┘ wait interval, fetch online nodes, send_one each sample
//! ```
//!
//! Cancellation is observed both while waiting for the next tick and while
//! a tick is in progress, so a disconnect never waits out the interval.
//! A failed node lookup is logged and retried on the next tick.

use crate::dispatcher::BroadcastDispatcher;
use crate::events::{EventEncoder, EventType};
use crate::generator::MetricGenerator;
use crate::metrics::BusMetrics;
use crate::subscriber::{SendOutcome, Subscriber};
use async_trait::async_trait;
use edge_store::{DocumentStore, Filter, StoreError};
use edge_types::{NodeStatus, EDGE_NODES};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

/// Source of the ids of nodes currently online.
#[async_trait]
pub trait OnlineNodeSource: Send + Sync {
    async fn online_node_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Reads online node ids from the `edge_nodes` collection.
pub struct StoreNodeSource {
    store: Arc<dyn DocumentStore>,
}

impl StoreNodeSource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OnlineNodeSource for StoreNodeSource {
    async fn online_node_ids(&self) -> Result<Vec<String>, StoreError> {
        let docs = self
            .store
            .find(EDGE_NODES, &Filter::eq("status", NodeStatus::Online.as_str()))
            .await?;
        Ok(docs
            .iter()
            .filter_map(|doc| doc.get("id").and_then(Value::as_str).map(str::to_string))
            .collect())
    }
}

/// Collaborators shared by every publisher of one hub.
#[derive(Clone)]
pub struct PublisherContext {
    pub dispatcher: Arc<BroadcastDispatcher>,
    pub encoder: Arc<EventEncoder>,
    pub source: Arc<dyn OnlineNodeSource>,
    pub generator: Arc<dyn MetricGenerator>,
    pub metrics: Arc<BusMetrics>,
    pub interval: Duration,
}

/// Why a publisher stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherExit {
    /// Shutdown was signalled (connection closed).
    Cancelled,
    /// The subscriber stopped accepting messages.
    SubscriberGone(SendOutcome),
}

pub struct PeriodicPublisher {
    subscriber: Subscriber,
    context: PublisherContext,
}

impl PeriodicPublisher {
    pub fn new(subscriber: Subscriber, context: PublisherContext) -> Self {
        Self {
            subscriber,
            context,
        }
    }

    /// Run on the current runtime. The returned handle cancels it.
    pub fn spawn(self) -> PublisherHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        PublisherHandle { shutdown, task }
    }

    /// Loop until cancelled or the subscriber goes away, then unregister it.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> PublisherExit {
        let id = self.subscriber.id();
        let interval = self.context.interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(subscriber_id = %id, interval_ms = interval.as_millis() as u64, "Publisher started");

        let exit = if *shutdown.borrow() {
            PublisherExit::Cancelled
        } else {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break PublisherExit::Cancelled,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break PublisherExit::Cancelled,
                    step = self.tick() => {
                        if let Some(exit) = step {
                            break exit;
                        }
                    }
                }
            }
        };

        let removed = self.context.dispatcher.registry().unregister(&self.subscriber);
        if removed && matches!(exit, PublisherExit::SubscriberGone(_)) {
            self.context.metrics.record_eviction();
        }
        debug!(subscriber_id = %id, exit = ?exit, "Publisher stopped");
        exit
    }

    /// One interval's worth of work. `Some` means stop.
    async fn tick(&self) -> Option<PublisherExit> {
        self.context.metrics.record_tick();

        if !self.subscriber.is_open() {
            return Some(PublisherExit::SubscriberGone(SendOutcome::Closed));
        }

        let node_ids = match self.context.source.online_node_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(
                    subscriber_id = %self.subscriber.id(),
                    error = %e,
                    "Failed to load online nodes, retrying next tick"
                );
                return None;
            }
        };

        for node_id in node_ids {
            let sample = self.context.generator.sample(&node_id);
            let message = match self.context.encoder.encode(EventType::MetricsUpdate, &sample) {
                Ok(message) => message,
                Err(e) => {
                    self.context.metrics.record_encode_failure();
                    error!(node_id = %node_id, error = %e, "Failed to encode metrics sample");
                    continue;
                }
            };
            match self.context.dispatcher.send_one(&self.subscriber, &message).await {
                SendOutcome::Delivered => {}
                failed => return Some(PublisherExit::SubscriberGone(failed)),
            }
        }
        None
    }
}

/// Owner side of a spawned publisher.
pub struct PublisherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<PublisherExit>,
}

impl PublisherHandle {
    /// Signal the publisher to stop. Idempotent.
    pub fn cancel(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel and wait for the task. `None` if it panicked.
    pub async fn shutdown(self) -> Option<PublisherExit> {
        self.cancel();
        match self.task.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                error!(error = %e, "Publisher task failed");
                None
            }
        }
    }
}
