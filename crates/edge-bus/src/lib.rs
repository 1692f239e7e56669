//! # Edge Bus - Broadcast Notification Subsystem
//!
//! Pushes typed events about edge nodes and workloads to every connected
//! subscriber, and streams synthetic metrics to each subscriber while it
//! stays connected.
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`SubscriberRegistry`] | Who is reachable right now |
//! | [`EventEncoder`] | Mutation to `{type, data, timestamp}` text |
//! | [`BroadcastDispatcher`] | Fan-out with eviction of dead subscribers |
//! | [`PeriodicPublisher`] | Per-subscriber `metrics_update` loop |
//! | [`NotificationHub`] | Entry point for the REST and WebSocket layers |
//!
//! ## Delivery Guarantees
//!
//! - Best effort. A failed send evicts the subscriber; it is never retried.
//! - Messages reach one subscriber in the order they were issued to it.
//! - Nothing is ordered between a REST broadcast and a concurrent publisher tick.
//! - Notifying never fails or blocks the caller on a slow subscriber.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod dispatcher;
pub mod events;
pub mod generator;
pub mod hub;
pub mod metrics;
pub mod publisher;
pub mod registry;
pub mod subscriber;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use dispatcher::{BroadcastDispatcher, BroadcastReport};
pub use events::{EncodeError, EventEncoder, EventType, MetricsSample, WireMessage};
pub use generator::{MetricGenerator, MetricRanges, RandomMetricGenerator};
pub use hub::{HubConfig, NotificationHub, DEFAULT_PUBLISH_INTERVAL};
pub use metrics::BusMetrics;
pub use publisher::{
    OnlineNodeSource, PeriodicPublisher, PublisherContext, PublisherExit, PublisherHandle,
    StoreNodeSource,
};
pub use registry::SubscriberRegistry;
pub use subscriber::{ChannelState, SendOutcome, Subscriber, SubscriberChannel, SubscriberId};
