//! WebSocket connection handler.
//!
//! Each upgraded socket becomes one subscriber of the notification hub:
//!
//! - a writer task drains the channel's outbound queue into the socket
//! - the connection loop reads (and discards) inbound frames until the
//!   client closes, the socket errors, the writer stops, or a send fails
//! - on the way out the hub cancels the subscriber's publisher and
//!   unregisters it

use crate::middleware::GatewayMetrics;
use crate::ws::channel::WsChannel;
use axum::extract::ws::{Message, WebSocket};
use edge_bus::{ChannelState, NotificationHub};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Serves one upgraded WebSocket connection.
pub struct SubscriberConnection {
    hub: Arc<NotificationHub>,
    metrics: Arc<GatewayMetrics>,
    buffer: usize,
}

impl SubscriberConnection {
    pub fn new(hub: Arc<NotificationHub>, metrics: Arc<GatewayMetrics>, buffer: usize) -> Self {
        Self {
            hub,
            metrics,
            buffer,
        }
    }

    /// Run until the connection ends.
    pub async fn handle(self, socket: WebSocket) {
        let (mut sink, mut stream) = socket.split();
        let (channel, mut outbound) = WsChannel::new(self.buffer);

        // Upgrade already completed the handshake.
        channel.set_state(ChannelState::Open);
        let subscriber = self.hub.on_subscriber_connected(channel.clone());
        self.metrics.record_ws_connect();
        let id = subscriber.id();

        let mut writer = tokio::spawn(async move {
            while let Some(text) = outbound.recv().await {
                if let Err(e) = sink.send(Message::Text(text.to_string())).await {
                    debug!(subscriber_id = %id, error = %e, "WebSocket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reason = loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None => break "client closed",
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(subscriber_id = %id, error = %e, "WebSocket read failed");
                        break "read error";
                    }
                },
                _ = channel.failed() => break "send failed",
                _ = &mut writer => break "writer stopped",
            }
        };

        channel.set_state(ChannelState::Closing);
        self.hub.on_subscriber_disconnected(&subscriber).await;
        writer.abort();
        channel.set_state(ChannelState::Closed);
        self.metrics.record_ws_disconnect();

        info!(subscriber_id = %id, reason, "WebSocket connection closed");
    }
}
