//! REST surface under `/api`.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `/api/edge-nodes` | [`nodes`] |
//! | `/api/workloads` | [`workloads`] |
//! | `/api/metrics`, `/api/security-events` | [`telemetry`] |
//! | `/api/analytics` | [`analytics`] |
//! | `/api/demo/setup-smart-city` | [`demo`] |
//!
//! Handlers notify the hub only after the store mutation succeeded. The
//! notification outcome never changes the response.

pub mod analytics;
pub mod demo;
pub mod extract;
pub mod nodes;
pub mod telemetry;
pub mod workloads;

use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/edge-nodes",
            post(nodes::create_node).get(nodes::list_nodes),
        )
        .route(
            "/api/edge-nodes/:id",
            get(nodes::get_node)
                .put(nodes::update_node)
                .delete(nodes::delete_node),
        )
        .route(
            "/api/workloads",
            post(workloads::create_workload).get(workloads::list_workloads),
        )
        .route(
            "/api/workloads/node/:node_id",
            get(workloads::list_node_workloads),
        )
        .route(
            "/api/workloads/:id/status",
            put(workloads::update_workload_status),
        )
        .route("/api/metrics", post(telemetry::record_metric))
        .route("/api/metrics/node/:node_id", get(telemetry::node_metrics))
        .route(
            "/api/security-events",
            post(telemetry::record_security_event).get(telemetry::security_events),
        )
        .route("/api/analytics", get(analytics::system_analytics))
        .route("/api/demo/setup-smart-city", post(demo::setup_smart_city))
}
