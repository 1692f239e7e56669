//! Bus counters.
//!
//! Lock-free atomics; readers see a consistent-enough view for dashboards.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct BusMetrics {
    /// Currently connected subscribers (gauge)
    pub subscribers_connected: AtomicU64,
    /// Subscribers ever connected
    pub subscribers_total: AtomicU64,
    /// Broadcasts issued
    pub broadcasts: AtomicU64,
    /// Messages accepted by a subscriber channel
    pub messages_delivered: AtomicU64,
    /// Subscribers evicted after a failed or refused send
    pub evictions: AtomicU64,
    /// Notify calls dropped because the payload could not be encoded
    pub encode_failures: AtomicU64,
    /// Publisher interval ticks processed
    pub publisher_ticks: AtomicU64,
}

impl BusMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connect(&self) {
        self.subscribers_connected.fetch_add(1, Ordering::Relaxed);
        self.subscribers_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnect(&self) {
        // Saturate rather than wrap if a disconnect is reported twice.
        let _ = self
            .subscribers_connected
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_broadcast(&self, delivered: u64, evicted: u64) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.messages_delivered.fetch_add(delivered, Ordering::Relaxed);
        self.evictions.fetch_add(evicted, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick(&self) {
        self.publisher_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "subscribers": {
                "connected": self.subscribers_connected.load(Ordering::Relaxed),
                "total": self.subscribers_total.load(Ordering::Relaxed),
            },
            "broadcast": {
                "issued": self.broadcasts.load(Ordering::Relaxed),
                "delivered": self.messages_delivered.load(Ordering::Relaxed),
                "evictions": self.evictions.load(Ordering::Relaxed),
                "encode_failures": self.encode_failures.load(Ordering::Relaxed),
            },
            "publisher": {
                "ticks": self.publisher_ticks.load(Ordering::Relaxed),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_gauge() {
        let metrics = BusMetrics::new();
        metrics.record_connect();
        metrics.record_connect();
        metrics.record_disconnect();
        metrics.record_disconnect();
        metrics.record_disconnect();

        assert_eq!(metrics.subscribers_connected.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.subscribers_total.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_json_export() {
        let metrics = BusMetrics::new();
        metrics.record_broadcast(3, 1);
        metrics.record_encode_failure();

        let json = metrics.to_json();
        assert_eq!(json["broadcast"]["issued"], 1);
        assert_eq!(json["broadcast"]["delivered"], 3);
        assert_eq!(json["broadcast"]["evictions"], 1);
        assert_eq!(json["broadcast"]["encode_failures"], 1);
    }
}
