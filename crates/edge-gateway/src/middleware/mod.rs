//! Middleware stack for the gateway.
//!
//! Layer order: Request → CORS → Trace → Metrics → Handler

pub mod cors;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::{track_requests, GatewayMetrics, RequestTimer};
pub use self::tracing::{create_trace_layer, HttpTraceLayer};
