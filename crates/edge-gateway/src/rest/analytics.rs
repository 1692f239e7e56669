use crate::domain::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use edge_types::SystemAnalytics;

/// `GET /api/analytics`
pub async fn system_analytics(
    State(state): State<AppState>,
) -> Result<Json<SystemAnalytics>, ApiError> {
    Ok(Json(state.repo.analytics().await?))
}
