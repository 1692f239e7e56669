//! # Event Encoder
//!
//! Turns a domain mutation into a self-describing text message.
//!
//! ## Wire shapes
//!
//! ```text
//! entity events   {"type": "node_created", "data": {...}, "timestamp": "..."}
//! node_deleted    {"type": "node_deleted", "node_id": "...", "timestamp": "..."}
//! metrics_update  {"type": "metrics_update", "node_id": "...", "cpu_usage": ..,
//!                  "memory_usage": .., "network_latency": .., "timestamp": "..."}
//! ```
//!
//! Timestamps are UTC RFC 3339 with microsecond precision and never go
//! backwards for a given encoder, even if the wall clock does.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Fixed vocabulary of pushed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    NodeCreated,
    NodeUpdated,
    NodeDeleted,
    WorkloadCreated,
    WorkloadUpdated,
    SecurityEvent,
    MetricsUpdate,
}

/// Where an event's payload goes in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PayloadShape {
    /// Payload object under `data`.
    Data,
    /// Payload string under `node_id`.
    NodeId,
    /// Payload object fields merged into the envelope.
    Inline,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        Self::NodeCreated,
        Self::NodeUpdated,
        Self::NodeDeleted,
        Self::WorkloadCreated,
        Self::WorkloadUpdated,
        Self::SecurityEvent,
        Self::MetricsUpdate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeCreated => "node_created",
            Self::NodeUpdated => "node_updated",
            Self::NodeDeleted => "node_deleted",
            Self::WorkloadCreated => "workload_created",
            Self::WorkloadUpdated => "workload_updated",
            Self::SecurityEvent => "security_event",
            Self::MetricsUpdate => "metrics_update",
        }
    }

    fn shape(&self) -> PayloadShape {
        match self {
            Self::NodeDeleted => PayloadShape::NodeId,
            Self::MetricsUpdate => PayloadShape::Inline,
            _ => PayloadShape::Data,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthetic or reported metric sample pushed as `metrics_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub node_id: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub network_latency: f64,
}

/// Encoding failures. Fatal to the notify call that hit them, nothing else.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{event_type} expects {expected} payload, got {actual}")]
    UnexpectedPayload {
        event_type: EventType,
        expected: &'static str,
        actual: &'static str,
    },
}

/// An encoded, ready-to-send text frame.
///
/// The text is shared, so fanning one message out to many subscribers
/// does not copy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    event_type: EventType,
    timestamp: DateTime<Utc>,
    text: Arc<str>,
}

impl WireMessage {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }
}

/// Stateful encoder: remembers the last issued timestamp.
#[derive(Debug, Default)]
pub struct EventEncoder {
    last_micros: AtomicI64,
}

impl EventEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `payload` as an event of type `event_type`.
    pub fn encode<T>(&self, event_type: EventType, payload: &T) -> Result<WireMessage, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(payload)?;

        let mut envelope = Map::new();
        envelope.insert("type".into(), Value::from(event_type.as_str()));

        match (event_type.shape(), payload) {
            (PayloadShape::Data, data) => {
                envelope.insert("data".into(), data);
            }
            (PayloadShape::NodeId, Value::String(node_id)) => {
                envelope.insert("node_id".into(), Value::String(node_id));
            }
            (PayloadShape::Inline, Value::Object(fields)) => {
                for (key, value) in fields {
                    if key != "type" && key != "timestamp" {
                        envelope.insert(key, value);
                    }
                }
            }
            (PayloadShape::NodeId, other) => {
                return Err(unexpected(event_type, "a string", &other));
            }
            (PayloadShape::Inline, other) => {
                return Err(unexpected(event_type, "an object", &other));
            }
        }

        let timestamp = self.next_timestamp();
        envelope.insert(
            "timestamp".into(),
            Value::from(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let text = serde_json::to_string(&envelope)?;
        Ok(WireMessage {
            event_type,
            timestamp,
            text: text.into(),
        })
    }

    /// Current time, clamped so it never precedes the last issued timestamp.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let previous = self.last_micros.fetch_max(now, Ordering::AcqRel);
        let issued = previous.max(now);
        Utc.timestamp_micros(issued).single().unwrap_or_else(Utc::now)
    }
}

fn unexpected(event_type: EventType, expected: &'static str, actual: &Value) -> EncodeError {
    let actual = match actual {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    EncodeError::UnexpectedPayload {
        event_type,
        expected,
        actual,
    }
}
