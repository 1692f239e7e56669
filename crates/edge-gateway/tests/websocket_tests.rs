//! # WebSocket Transport Tests
//!
//! Real clients against a started service: frames arrive over the socket,
//! and a closed or overflowing connection leaves nothing behind in the hub.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use edge_bus::test_utils::FixedMetricGenerator;
use edge_bus::EventType;
use edge_gateway::{EdgeGatewayService, GatewayConfig};
use edge_store::InMemoryDocumentStore;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(10);

async fn started_service(buffer: usize) -> (EdgeGatewayService, SocketAddr) {
    let mut config = GatewayConfig::default();
    config.http.host = Ipv4Addr::LOCALHOST.into();
    config.http.port = 0;
    config.websocket.publish_interval = Duration::from_secs(3600);
    config.websocket.message_buffer_size = buffer;

    let mut service = EdgeGatewayService::with_generator(
        config,
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(FixedMetricGenerator::new(42.0, 64.0, 12.5)),
    )
    .unwrap();
    let addr = service.start().await.unwrap();
    (service, addr)
}

async fn connect(service: &EdgeGatewayService, addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let hub = service.hub();
    eventually(|| hub.subscriber_count() == 1).await;
    client
}

async fn eventually<F: Fn() -> bool>(condition: F) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition met within timeout");
}

async fn within<F: Future>(future: F) -> F::Output {
    timeout(WAIT, future).await.expect("completed within timeout")
}

/// Next text frame as JSON, skipping control frames.
async fn next_event(client: &mut Client) -> Value {
    loop {
        let frame = within(client.next()).await.unwrap().unwrap();
        if frame.is_text() {
            return serde_json::from_str(frame.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_node_created_reaches_socket_and_close_cleans_up() {
    let (mut service, addr) = started_service(64).await;
    let mut client = connect(&service, addr).await;
    let hub = service.hub();
    assert_eq!(hub.publisher_count(), 1);
    assert_eq!(service.metrics().websocket_connections.load(Ordering::Relaxed), 1);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/edge-nodes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "name": "cam-1", "location": "Main St", "node_type": "traffic_camera" })
                .to_string(),
        ))
        .unwrap();
    let response = service.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let node: Value = serde_json::from_slice(&bytes).unwrap();

    let event = next_event(&mut client).await;
    assert_eq!(event["type"], "node_created");
    assert_eq!(event["data"]["id"], node["id"]);

    within(client.close(None)).await.unwrap();

    eventually(|| hub.subscriber_count() == 0 && hub.publisher_count() == 0).await;
    let metrics = service.metrics();
    eventually(|| metrics.websocket_connections.load(Ordering::Relaxed) == 0).await;

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_queue_overflow_evicts_and_closes_connection() {
    let (mut service, addr) = started_service(1).await;
    let mut client = connect(&service, addr).await;
    let hub = service.hub();

    // The client reads nothing until the hub has given up on it.
    let filler = json!({ "id": "n1", "name": "x".repeat(64 * 1024) });
    within(async {
        while hub.subscriber_count() > 0 {
            hub.notify(EventType::NodeUpdated, &filler).await;
        }
    })
    .await;

    eventually(|| hub.publisher_count() == 0).await;
    assert!(hub.metrics().evictions.load(Ordering::Relaxed) >= 1);

    // Whatever was queued may still arrive; then the stream must end.
    within(async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;

    let metrics = service.metrics();
    eventually(|| metrics.websocket_connections.load(Ordering::Relaxed) == 0).await;

    service.shutdown().await.unwrap();
}
