//! # REST API Tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`:
//! routes, status codes, `{"detail": ...}` error bodies, analytics and the
//! demo fleet.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use edge_gateway::{EdgeGatewayService, GatewayConfig};
use edge_store::InMemoryDocumentStore;
use serde_json::{json, Value};
use tower::ServiceExt;

fn service() -> EdgeGatewayService {
    let mut config = GatewayConfig::default();
    config.websocket.publish_interval = Duration::from_secs(3600);
    EdgeGatewayService::new(config, Arc::new(InMemoryDocumentStore::new())).unwrap()
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_node(router: &Router, name: &str) -> Value {
    let (status, node) = call(
        router,
        Method::POST,
        "/api/edge-nodes",
        Some(json!({ "name": name, "location": "Main St", "node_type": "traffic_camera" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    node
}

async fn create_workload(router: &Router, node_id: &str) -> Value {
    let (status, workload) = call(
        router,
        Method::POST,
        "/api/workloads",
        Some(json!({
            "name": "vision",
            "description": "traffic analysis",
            "node_id": node_id,
            "workload_type": "ai_analytics",
            "cpu_request": 2.0,
            "memory_request": 4.0,
            "priority": "high"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    workload
}

#[tokio::test]
async fn test_health_check() {
    let router = service().router();
    let (status, body) = call(&router, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn test_node_create_get_list() {
    let router = service().router();
    let node = create_node(&router, "cam-1").await;
    let id = node["id"].as_str().unwrap();

    assert_eq!(node["status"], "offline");
    assert_eq!(node["kubernetes_version"], "k3s-1.28");
    assert_eq!(node["workload_count"], 0);

    let (status, fetched) = call(&router, Method::GET, &format!("/api/edge-nodes/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "cam-1");

    create_node(&router, "cam-2").await;
    let (status, list) = call(&router, Method::GET, "/api/edge-nodes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_node_is_404_with_detail() {
    let router = service().router();

    let (status, body) = call(&router, Method::GET, "/api/edge-nodes/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Edge node not found" }));

    let (status, body) = call(
        &router,
        Method::PUT,
        "/api/edge-nodes/missing",
        Some(json!({ "status": "online" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Edge node not found");

    let (status, _) = call(&router, Method::DELETE, "/api/edge-nodes/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_node_update_applies_present_fields_only() {
    let router = service().router();
    let node = create_node(&router, "cam-1").await;
    let id = node["id"].as_str().unwrap();

    let (status, updated) = call(
        &router,
        Method::PUT,
        &format!("/api/edge-nodes/{id}"),
        Some(json!({ "status": "online", "cpu_usage": 42.5 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "online");
    assert_eq!(updated["cpu_usage"], 42.5);
    assert_eq!(updated["name"], "cam-1");
    assert_eq!(updated["location"], "Main St");
    assert_ne!(updated["last_heartbeat"], node["last_heartbeat"]);
}

#[tokio::test]
async fn test_node_delete() {
    let router = service().router();
    let node = create_node(&router, "cam-1").await;
    let uri = format!("/api/edge-nodes/{}", node["id"].as_str().unwrap());

    let (status, body) = call(&router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Edge node deleted successfully" }));

    let (status, _) = call(&router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_workload_requires_existing_node() {
    let router = service().router();
    let (status, body) = call(
        &router,
        Method::POST,
        "/api/workloads",
        Some(json!({
            "name": "vision",
            "description": "traffic analysis",
            "node_id": "missing",
            "workload_type": "ai_analytics",
            "cpu_request": 2.0,
            "memory_request": 4.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Edge node not found");

    let (_, list) = call(&router, Method::GET, "/api/workloads", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_workload_create_counts_on_node() {
    let router = service().router();
    let node = create_node(&router, "cam-1").await;
    let node_id = node["id"].as_str().unwrap();
    let other = create_node(&router, "cam-2").await;

    let workload = create_workload(&router, node_id).await;
    assert_eq!(workload["status"], "pending");
    assert_eq!(workload["priority"], "high");
    create_workload(&router, node_id).await;

    let (_, node) = call(&router, Method::GET, &format!("/api/edge-nodes/{node_id}"), None).await;
    assert_eq!(node["workload_count"], 2);

    let (_, all) = call(&router, Method::GET, "/api/workloads", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, on_node) = call(
        &router,
        Method::GET,
        &format!("/api/workloads/node/{node_id}"),
        None,
    )
    .await;
    assert_eq!(on_node.as_array().unwrap().len(), 2);

    let (_, on_other) = call(
        &router,
        Method::GET,
        &format!("/api/workloads/node/{}", other["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(on_other, json!([]));
}

#[tokio::test]
async fn test_workload_status_transitions() {
    let router = service().router();
    let node = create_node(&router, "cam-1").await;
    let node_id = node["id"].as_str().unwrap();
    let workload = create_workload(&router, node_id).await;
    let id = workload["id"].as_str().unwrap();

    let (status, body) = call(
        &router,
        Method::PUT,
        &format!("/api/workloads/{id}/status?status=running"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Workload status updated successfully" }));

    let (_, list) = call(&router, Method::GET, &format!("/api/workloads/node/{node_id}"), None).await;
    let running = &list[0];
    assert_eq!(running["status"], "running");
    assert!(running["deployed_at"].is_string());
    assert!(running["completed_at"].is_null());

    let (status, _) = call(
        &router,
        Method::PUT,
        &format!("/api/workloads/{id}/status?status=completed&execution_time=12.5"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = call(&router, Method::GET, &format!("/api/workloads/node/{node_id}"), None).await;
    let done = &list[0];
    assert_eq!(done["status"], "completed");
    assert!(done["completed_at"].is_string());
    assert_eq!(done["execution_time"], 12.5);
}

#[tokio::test]
async fn test_workload_status_errors() {
    let router = service().router();

    let (status, body) = call(
        &router,
        Method::PUT,
        "/api/workloads/missing/status?status=running",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Workload not found");

    let (status, body) = call(
        &router,
        Method::PUT,
        "/api/workloads/missing/status?status=exploded",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_invalid_body_uses_detail_shape() {
    let router = service().router();
    let (status, body) = call(
        &router,
        Method::POST,
        "/api/edge-nodes",
        Some(json!({ "name": "cam-1" })),
    )
    .await;

    assert!(status.is_client_error());
    assert!(body["detail"].as_str().unwrap().contains("location"));
}

#[tokio::test]
async fn test_metrics_newest_first_with_limit() {
    let router = service().router();
    for (hour, cpu) in [(1, 10.0), (3, 30.0), (2, 20.0)] {
        let (status, stored) = call(
            &router,
            Method::POST,
            "/api/metrics",
            Some(json!({
                "node_id": "n1",
                "timestamp": format!("2024-01-01T0{hour}:00:00Z"),
                "cpu_usage": cpu,
                "memory_usage": 50.0,
                "network_latency": 12.0,
                "deployment_latency": 8.0,
                "success_rate": 99.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(stored["id"].is_string());
    }

    let (_, all) = call(&router, Method::GET, "/api/metrics/node/n1", None).await;
    let cpu: Vec<f64> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["cpu_usage"].as_f64().unwrap())
        .collect();
    assert_eq!(cpu, vec![30.0, 20.0, 10.0]);

    let (_, limited) = call(&router, Method::GET, "/api/metrics/node/n1?limit=1", None).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
    assert_eq!(limited[0]["cpu_usage"], 30.0);

    let (_, other) = call(&router, Method::GET, "/api/metrics/node/n2", None).await;
    assert_eq!(other, json!([]));
}

#[tokio::test]
async fn test_security_events() {
    let router = service().router();
    for (minute, kind) in [(1, "mtls_handshake"), (2, "rbac_violation")] {
        let (status, event) = call(
            &router,
            Method::POST,
            "/api/security-events",
            Some(json!({
                "node_id": "n1",
                "event_type": kind,
                "severity": "high",
                "description": "suspicious activity",
                "timestamp": format!("2024-01-01T00:0{minute}:00Z")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["resolved"], false);
    }

    let (_, events) = call(&router, Method::GET, "/api/security-events", None).await;
    assert_eq!(events[0]["event_type"], "rbac_violation");
    assert_eq!(events[1]["event_type"], "mtls_handshake");

    let (_, limited) = call(&router, Method::GET, "/api/security-events?limit=1", None).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_demo_setup_and_analytics() {
    let router = service().router();

    let (status, body) = call(&router, Method::POST, "/api/demo/setup-smart-city", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Created 4 demo edge nodes");
    let nodes = body["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    assert!(nodes.iter().all(|n| n["status"] == "online"));
    assert_eq!(nodes[3]["name"], "Smart Streetlight Controller");

    let (status, analytics) = call(&router, Method::GET, "/api/analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(analytics["total_nodes"], 4);
    assert_eq!(analytics["active_nodes"], 4);
    assert_eq!(analytics["total_workloads"], 0);
    assert_eq!(analytics["success_rate"], 100.0);
    assert_eq!(analytics["security_incidents"], 0);

    let cpu = analytics["average_cpu_usage"].as_f64().unwrap();
    assert!((10.0..=65.0).contains(&cpu));
}

#[tokio::test]
async fn test_analytics_success_rate_and_offline_nodes() {
    let router = service().router();
    let node = create_node(&router, "cam-1").await;
    let node_id = node["id"].as_str().unwrap();

    for status in ["completed", "completed", "completed", "failed"] {
        let workload = create_workload(&router, node_id).await;
        let id = workload["id"].as_str().unwrap();
        call(
            &router,
            Method::PUT,
            &format!("/api/workloads/{id}/status?status={status}"),
            None,
        )
        .await;
    }
    create_workload(&router, node_id).await;

    let (_, analytics) = call(&router, Method::GET, "/api/analytics", None).await;
    assert_eq!(analytics["total_nodes"], 1);
    assert_eq!(analytics["active_nodes"], 0);
    assert_eq!(analytics["total_workloads"], 5);
    assert_eq!(analytics["running_workloads"], 0);
    assert_eq!(analytics["success_rate"], 75.0);
    assert_eq!(analytics["average_cpu_usage"], 0.0);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let router = service().router();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/edge-nodes")
        .header(header::ORIGIN, "http://dashboard.local")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_metrics_endpoint_counts_requests() {
    let router = service().router();
    call(&router, Method::GET, "/api/edge-nodes", None).await;
    call(&router, Method::GET, "/api/edge-nodes/missing", None).await;

    let (status, metrics) = call(&router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["gateway"]["requests"]["success"], 1);
    assert_eq!(metrics["gateway"]["requests"]["error"], 1);
    assert!(metrics["bus"].is_object());
}
