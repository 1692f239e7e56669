//! # Subscriber
//!
//! A connected client entitled to receive pushed events, and the channel
//! port through which messages reach it.
//!
//! The bus never talks to a socket directly. Transports (the gateway's
//! WebSocket adapter, test doubles) implement [`SubscriberChannel`] and
//! report each send as an explicit [`SendOutcome`].

use crate::events::WireMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identity of one subscriber connection.
///
/// UUID v7, so ids sort by connection time in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a subscriber channel.
///
/// ```text
/// Connecting ──→ Open ──→ Closing ──→ Closed
/// ```
///
/// Only `Open` channels are sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Result of a single send attempt.
///
/// Anything other than `Delivered` is terminal for the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The channel was not open; nothing was sent.
    Closed,
    /// The transport rejected the message.
    TransportError(String),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => f.write_str("delivered"),
            Self::Closed => f.write_str("closed"),
            Self::TransportError(reason) => write!(f, "transport error: {}", reason),
        }
    }
}

/// Outbound side of a live connection.
///
/// A channel whose send fails must stop reporting `Open` and let its
/// transport know, so the connection is torn down. The hub drops the
/// publisher of an evicted subscriber either way, but only the transport
/// can close the socket.
#[async_trait]
pub trait SubscriberChannel: Send + Sync {
    /// Current lifecycle state.
    fn state(&self) -> ChannelState;

    /// Send one text frame.
    ///
    /// Implementations must not panic on a dead transport; they report it
    /// as `Closed` or `TransportError` instead.
    async fn send_text(&self, text: Arc<str>) -> SendOutcome;
}

/// Registry handle for one connection: identity plus its channel.
///
/// Cheap to clone; clones share the channel. Equality is by id.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    channel: Arc<dyn SubscriberChannel>,
}

impl Subscriber {
    pub fn new(channel: Arc<dyn SubscriberChannel>) -> Self {
        Self::with_id(SubscriberId::new(), channel)
    }

    pub fn with_id(id: SubscriberId, channel: Arc<dyn SubscriberChannel>) -> Self {
        Self { id, channel }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Send without a liveness check. Use the dispatcher instead.
    pub(crate) async fn send_raw(&self, message: &WireMessage) -> SendOutcome {
        self.channel.send_text(message.shared_text()).await
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChannel;

    #[test]
    fn test_ids_are_unique_v7() {
        let a = SubscriberId::new();
        let b = SubscriberId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_equality_by_id() {
        let channel = MockChannel::open();
        let a = Subscriber::new(channel.clone());
        let a_clone = a.clone();
        let b = Subscriber::new(channel);
        assert_eq!(a, a_clone);
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_reflects_channel_state() {
        let channel = MockChannel::open();
        let sub = Subscriber::new(channel.clone());
        assert!(sub.is_open());
        channel.set_state(ChannelState::Closing);
        assert!(!sub.is_open());
        assert_eq!(sub.state(), ChannelState::Closing);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SendOutcome::Delivered.to_string(), "delivered");
        assert_eq!(
            SendOutcome::TransportError("reset".into()).to_string(),
            "transport error: reset"
        );
        assert!(!SendOutcome::Closed.is_delivered());
    }
}
