//! WebSocket subscriber endpoint.

pub mod channel;
pub mod handler;

pub use channel::WsChannel;
pub use handler::SubscriberConnection;

use crate::state::AppState;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;

/// `GET /ws`: upgrade and serve the connection as a hub subscriber.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let connection = SubscriberConnection::new(
        state.hub.clone(),
        state.metrics.clone(),
        state.config.websocket.message_buffer_size,
    );
    ws.on_upgrade(move |socket| connection.handle(socket))
}
