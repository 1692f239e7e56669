//! `/api/edge-nodes` handlers.

use crate::domain::ApiError;
use crate::rest::extract::ApiJson;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use edge_bus::EventType;
use edge_types::{EdgeNode, EdgeNodeCreate, EdgeNodeUpdate};
use serde_json::{json, Value};
use tracing::info;

pub async fn create_node(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EdgeNodeCreate>,
) -> Result<Json<EdgeNode>, ApiError> {
    let node = EdgeNode::from(body);
    state.repo.insert_node(&node).await?;
    info!(node_id = %node.id, node_type = %node.node_type, "Edge node registered");

    state.hub.notify(EventType::NodeCreated, &node).await;
    Ok(Json(node))
}

pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<EdgeNode>>, ApiError> {
    Ok(Json(state.repo.list_nodes().await?))
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EdgeNode>, ApiError> {
    state
        .repo
        .get_node(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::node_not_found)
}

pub async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<EdgeNodeUpdate>,
) -> Result<Json<EdgeNode>, ApiError> {
    let node = state
        .repo
        .update_node(&id, &update)
        .await?
        .ok_or_else(ApiError::node_not_found)?;

    state.hub.notify(EventType::NodeUpdated, &node).await;
    Ok(Json(node))
}

pub async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.repo.delete_node(&id).await? {
        return Err(ApiError::node_not_found());
    }
    info!(node_id = %id, "Edge node deleted");

    state.hub.notify_node_deleted(&id).await;
    Ok(Json(json!({ "message": "Edge node deleted successfully" })))
}
