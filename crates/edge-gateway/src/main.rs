//! # Edge Gateway
//!
//! Serves the edge fabric REST API and the `/ws` notification stream over
//! an in-memory document store until Ctrl-C.

use anyhow::{Context, Result};
use edge_gateway::{init_tracing, EdgeGatewayService, GatewayConfig, LogConfig};
use edge_store::InMemoryDocumentStore;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&LogConfig::from_env()).context("failed to install log subscriber")?;

    let config = GatewayConfig::from_env();
    let store = Arc::new(InMemoryDocumentStore::new());
    let mut service =
        EdgeGatewayService::new(config, store).context("invalid gateway configuration")?;

    let addr = service.start().await.context("failed to start gateway")?;
    info!(addr = %addr, "Edge gateway ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");

    service.shutdown().await?;
    Ok(())
}
