//! Edge gateway service: wiring and lifecycle.

use crate::adapters::EdgeRepository;
use crate::domain::{GatewayConfig, GatewayError};
use crate::middleware::{create_cors_layer, create_trace_layer, track_requests, GatewayMetrics};
use crate::rest::api_routes;
use crate::state::AppState;
use crate::ws::ws_upgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use edge_bus::{
    HubConfig, MetricGenerator, NotificationHub, RandomMetricGenerator, StoreNodeSource,
};
use edge_store::DocumentStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How long `shutdown` waits for the server task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// REST + WebSocket gateway over one document store.
pub struct EdgeGatewayService {
    config: Arc<GatewayConfig>,
    repo: EdgeRepository,
    hub: Arc<NotificationHub>,
    metrics: Arc<GatewayMetrics>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl EdgeGatewayService {
    /// Create a new service with random synthetic metrics.
    pub fn new(config: GatewayConfig, store: Arc<dyn DocumentStore>) -> Result<Self, GatewayError> {
        Self::with_generator(config, store, Arc::new(RandomMetricGenerator::new()))
    }

    /// Create a new service with a specific metric generator.
    pub fn with_generator(
        config: GatewayConfig,
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn MetricGenerator>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let hub = NotificationHub::new(
            HubConfig {
                publish_interval: config.websocket.publish_interval,
            },
            Arc::new(StoreNodeSource::new(Arc::clone(&store))),
        )
        .with_generator(generator);

        Ok(Self {
            repo: EdgeRepository::new(store, config.limits.clone()),
            hub: Arc::new(hub),
            metrics: Arc::new(GatewayMetrics::new()),
            config: Arc::new(config),
            shutdown_tx: None,
            server: None,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn hub(&self) -> Arc<NotificationHub> {
        Arc::clone(&self.hub)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// The full application router: `/api`, `/health`, `/metrics` and the
    /// WebSocket endpoint, behind request counting, tracing and CORS.
    pub fn router(&self) -> Router {
        let state = AppState {
            repo: self.repo.clone(),
            hub: Arc::clone(&self.hub),
            metrics: Arc::clone(&self.metrics),
            config: Arc::clone(&self.config),
        };

        Router::new()
            .route("/health", get(health_check))
            .route("/metrics", get(metrics_snapshot))
            .route(&self.config.websocket.path, get(ws_upgrade))
            .merge(api_routes())
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.metrics),
                track_requests,
            ))
            .layer(create_trace_layer())
            .layer(create_cors_layer(&self.config.cors))
            .with_state(state)
    }

    /// Bind and start serving in the background. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, GatewayError> {
        if self.server.is_some() {
            return Err(GatewayError::Serve("service already started".into()));
        }

        let listener = TcpListener::bind(self.config.http_addr()).await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router();

        self.server = Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        }));
        self.shutdown_tx = Some(shutdown_tx);

        info!(
            addr = %addr,
            ws_path = %self.config.websocket.path,
            publish_interval_ms = self.config.websocket.publish_interval.as_millis() as u64,
            "Edge gateway listening"
        );
        Ok(addr)
    }

    /// Stop accepting connections, stop every publisher and wait for the
    /// server task.
    pub async fn shutdown(&mut self) -> Result<(), GatewayError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.hub.close_all().await;

        if let Some(server) = self.server.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    error!(error = %e, "HTTP server error");
                    return Err(GatewayError::Serve(e.to_string()));
                }
                Ok(Err(e)) => return Err(GatewayError::Serve(e.to_string())),
                Err(_) => warn!("Server did not stop within the grace period"),
            }
        }

        info!("Edge gateway stopped");
        Ok(())
    }
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "edge-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "subscribers": state.hub.subscriber_count(),
    }))
}

async fn metrics_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "gateway": state.metrics.to_json(),
        "bus": state.hub.metrics().to_json(),
    }))
}
