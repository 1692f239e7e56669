//! WebSocket side of a subscriber channel.
//!
//! Sends never touch the socket. They enqueue onto a bounded queue drained
//! by the connection's writer task, so a slow client cannot stall a
//! broadcast. A full queue or a gone writer fails the send and flags the
//! connection for closing.

use async_trait::async_trait;
use edge_bus::{ChannelState, SendOutcome, SubscriberChannel};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;

fn encode_state(state: ChannelState) -> u8 {
    match state {
        ChannelState::Connecting => 0,
        ChannelState::Open => 1,
        ChannelState::Closing => 2,
        ChannelState::Closed => 3,
    }
}

fn decode_state(raw: u8) -> ChannelState {
    match raw {
        0 => ChannelState::Connecting,
        1 => ChannelState::Open,
        2 => ChannelState::Closing,
        _ => ChannelState::Closed,
    }
}

pub struct WsChannel {
    state: AtomicU8,
    outbound: mpsc::Sender<Arc<str>>,
    failure: Notify,
}

impl WsChannel {
    /// New channel in `Connecting` state plus the receiving end for the writer.
    pub fn new(buffer: usize) -> (Arc<Self>, mpsc::Receiver<Arc<str>>) {
        let (outbound, rx) = mpsc::channel(buffer.max(1));
        let channel = Arc::new(Self {
            state: AtomicU8::new(encode_state(ChannelState::Connecting)),
            outbound,
            failure: Notify::new(),
        });
        (channel, rx)
    }

    pub fn set_state(&self, state: ChannelState) {
        self.state.store(encode_state(state), Ordering::Release);
    }

    /// Resolves once a send has failed on this channel.
    pub async fn failed(&self) {
        self.failure.notified().await;
    }

    fn fail(&self, reason: &str) -> SendOutcome {
        // Only the first failure moves Open to Closing.
        let _ = self.state.compare_exchange(
            encode_state(ChannelState::Open),
            encode_state(ChannelState::Closing),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.failure.notify_one();
        SendOutcome::TransportError(reason.to_string())
    }
}

#[async_trait]
impl SubscriberChannel for WsChannel {
    fn state(&self) -> ChannelState {
        decode_state(self.state.load(Ordering::Acquire))
    }

    async fn send_text(&self, text: Arc<str>) -> SendOutcome {
        if !self.state().is_open() {
            return SendOutcome::Closed;
        }
        match self.outbound.try_send(text) {
            Ok(()) => SendOutcome::Delivered,
            Err(TrySendError::Full(_)) => self.fail("outbound queue full"),
            Err(TrySendError::Closed(_)) => self.fail("writer closed"),
        }
    }
}
