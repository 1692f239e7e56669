//! Edge Gateway - REST and WebSocket interface of the edge fabric.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EDGE GATEWAY                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐   │
//! │   │  REST /api   │    │  WebSocket   │    │ /health      │   │
//! │   │  (handlers)  │    │  /ws         │    │ /metrics     │   │
//! │   └──────┬───────┘    └──────┬───────┘    └──────────────┘   │
//! │          │                   │                               │
//! │   ┌──────┴──────────┐  ┌─────┴──────────────────────────┐    │
//! │   │ EdgeRepository  │  │ NotificationHub (edge-bus)     │    │
//! │   └──────┬──────────┘  └─────┬──────────────────────────┘    │
//! └──────────┼───────────────────┼───────────────────────────────┘
//!            ▼                   ▼
//!      DocumentStore        subscribers
//! ```
//!
//! Every successful mutation is followed by a hub notification. Failed
//! deliveries evict the subscriber and never reach the REST caller.
//!
//! # Usage
//!
//! ```ignore
//! use edge_gateway::{EdgeGatewayService, GatewayConfig};
//! use edge_store::InMemoryDocumentStore;
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let mut service = EdgeGatewayService::new(GatewayConfig::from_env(), store)?;
//! let addr = service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod rest;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod ws;

pub use adapters::EdgeRepository;
pub use domain::{ApiError, ConfigError, GatewayConfig, GatewayError};
pub use service::EdgeGatewayService;
pub use state::AppState;
pub use telemetry::{init_tracing, LogConfig, TelemetryError};
