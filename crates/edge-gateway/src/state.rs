//! Shared handler state.

use crate::adapters::EdgeRepository;
use crate::domain::GatewayConfig;
use crate::middleware::GatewayMetrics;
use edge_bus::NotificationHub;
use std::sync::Arc;

/// State handed to every axum handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub repo: EdgeRepository,
    pub hub: Arc<NotificationHub>,
    pub metrics: Arc<GatewayMetrics>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Page size for list endpoints taking `?limit=`, capped at the list limit.
    pub fn page_limit(&self, requested: Option<usize>) -> usize {
        let limits = &self.config.limits;
        requested
            .unwrap_or(limits.default_page_limit)
            .clamp(1, limits.list_limit)
    }
}
