//! Test doubles for the bus: a scriptable channel, a fixed metric
//! generator and a static online-node source.

use crate::events::MetricsSample;
use crate::generator::MetricGenerator;
use crate::publisher::OnlineNodeSource;
use crate::subscriber::{ChannelState, SendOutcome, SubscriberChannel};
use async_trait::async_trait;
use edge_store::StoreError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// In-memory subscriber channel that records what it was sent.
pub struct MockChannel {
    state: Mutex<ChannelState>,
    failure: Mutex<Option<String>>,
    /// Close the channel once this many messages were delivered.
    close_after: Mutex<Option<usize>>,
    received: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    notify: Notify,
}

impl MockChannel {
    pub fn new(state: ChannelState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            failure: Mutex::new(None),
            close_after: Mutex::new(None),
            received: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            notify: Notify::new(),
        })
    }

    pub fn open() -> Arc<Self> {
        Self::new(ChannelState::Open)
    }

    pub fn set_state(&self, state: ChannelState) {
        *self.state.lock() = state;
        self.notify.notify_waiters();
    }

    /// Make every following send fail with a transport error.
    pub fn fail_sends(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }

    pub fn close_after(&self, deliveries: usize) {
        *self.close_after.lock() = Some(deliveries);
    }

    /// Raw text of every delivered message, oldest first.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// The `type` field of every delivered message, oldest first.
    pub fn received_types(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .filter_map(|text| {
                let value: serde_json::Value = serde_json::from_str(text).ok()?;
                value.get("type")?.as_str().map(str::to_string)
            })
            .collect()
    }

    /// Send attempts that reached the channel, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` messages were delivered.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.received.lock().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl SubscriberChannel for MockChannel {
    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    async fn send_text(&self, text: Arc<str>) -> SendOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.state().is_open() {
            return SendOutcome::Closed;
        }
        if let Some(reason) = self.failure.lock().clone() {
            return SendOutcome::TransportError(reason);
        }

        let delivered = {
            let mut received = self.received.lock();
            received.push(text.to_string());
            received.len()
        };
        if matches!(*self.close_after.lock(), Some(limit) if delivered >= limit) {
            *self.state.lock() = ChannelState::Closed;
        }
        self.notify.notify_waiters();
        SendOutcome::Delivered
    }
}

/// Generator returning the same values for every node.
#[derive(Debug, Clone)]
pub struct FixedMetricGenerator {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub network_latency: f64,
}

impl FixedMetricGenerator {
    pub fn new(cpu_usage: f64, memory_usage: f64, network_latency: f64) -> Self {
        Self {
            cpu_usage,
            memory_usage,
            network_latency,
        }
    }
}

impl MetricGenerator for FixedMetricGenerator {
    fn sample(&self, node_id: &str) -> MetricsSample {
        MetricsSample {
            node_id: node_id.to_string(),
            cpu_usage: self.cpu_usage,
            memory_usage: self.memory_usage,
            network_latency: self.network_latency,
        }
    }
}

/// Online-node source backed by a settable list.
#[derive(Default)]
pub struct StaticNodeSource {
    ids: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl StaticNodeSource {
    pub fn new<I, S>(ids: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::default();
        source.set(ids);
        Arc::new(source)
    }

    pub fn set<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.ids.lock() = ids.into_iter().map(Into::into).collect();
    }

    pub fn fail_with(&self, reason: Option<&str>) {
        *self.failure.lock() = reason.map(str::to_string);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OnlineNodeSource for StaticNodeSource {
    async fn online_node_ids(&self) -> Result<Vec<String>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.failure.lock().clone() {
            return Err(StoreError::Unavailable(reason));
        }
        Ok(self.ids.lock().clone())
    }
}
