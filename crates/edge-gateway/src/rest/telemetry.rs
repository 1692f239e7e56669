//! Performance metrics and security events.

use crate::domain::ApiError;
use crate::rest::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use edge_bus::{EventType, MetricsSample};
use edge_types::{PerformanceMetric, SecurityEvent};
use serde::Deserialize;
use tracing::warn;

/// `?limit=` of the paged list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn record_metric(
    State(state): State<AppState>,
    ApiJson(metric): ApiJson<PerformanceMetric>,
) -> Result<Json<PerformanceMetric>, ApiError> {
    state.repo.insert_metric(&metric).await?;

    let sample = MetricsSample {
        node_id: metric.node_id.clone(),
        cpu_usage: metric.cpu_usage,
        memory_usage: metric.memory_usage,
        network_latency: metric.network_latency,
    };
    state.hub.notify(EventType::MetricsUpdate, &sample).await;
    Ok(Json(metric))
}

pub async fn node_metrics(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<Vec<PerformanceMetric>>, ApiError> {
    let limit = state.page_limit(query.limit);
    Ok(Json(state.repo.metrics_for_node(&node_id, limit).await?))
}

pub async fn record_security_event(
    State(state): State<AppState>,
    ApiJson(event): ApiJson<SecurityEvent>,
) -> Result<Json<SecurityEvent>, ApiError> {
    state.repo.insert_security_event(&event).await?;
    warn!(
        node_id = %event.node_id,
        event_type = %event.event_type,
        severity = ?event.severity,
        "Security event reported"
    );

    state.hub.notify(EventType::SecurityEvent, &event).await;
    Ok(Json(event))
}

pub async fn security_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<Vec<SecurityEvent>>, ApiError> {
    let limit = state.page_limit(query.limit);
    Ok(Json(state.repo.security_events(limit).await?))
}
