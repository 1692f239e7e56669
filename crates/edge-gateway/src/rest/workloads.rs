//! `/api/workloads` handlers.

use crate::domain::ApiError;
use crate::rest::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use edge_bus::EventType;
use edge_types::{Workload, WorkloadCreate, WorkloadStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Query of `PUT /api/workloads/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: WorkloadStatus,
    #[serde(default)]
    pub execution_time: Option<f64>,
}

pub async fn create_workload(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<WorkloadCreate>,
) -> Result<Json<Workload>, ApiError> {
    if state.repo.get_node(&body.node_id).await?.is_none() {
        return Err(ApiError::node_not_found());
    }

    let workload = Workload::from(body);
    state.repo.insert_workload(&workload).await?;
    state.repo.increment_workload_count(&workload.node_id).await?;
    info!(
        workload_id = %workload.id,
        node_id = %workload.node_id,
        "Workload scheduled"
    );

    state.hub.notify(EventType::WorkloadCreated, &workload).await;
    Ok(Json(workload))
}

pub async fn list_workloads(State(state): State<AppState>) -> Result<Json<Vec<Workload>>, ApiError> {
    Ok(Json(state.repo.list_workloads().await?))
}

pub async fn list_node_workloads(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<Vec<Workload>>, ApiError> {
    Ok(Json(state.repo.list_workloads_for_node(&node_id).await?))
}

pub async fn update_workload_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let workload = state
        .repo
        .update_workload_status(&id, query.status, query.execution_time)
        .await?
        .ok_or_else(ApiError::workload_not_found)?;
    info!(workload_id = %id, status = %query.status, "Workload status changed");

    state.hub.notify(EventType::WorkloadUpdated, &workload).await;
    Ok(Json(json!({ "message": "Workload status updated successfully" })))
}
