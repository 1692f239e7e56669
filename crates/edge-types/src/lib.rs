//! # Edge Types Crate
//!
//! Domain entities for the edge fabric: edge nodes, the workloads scheduled
//! onto them, performance samples and security events.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every crate serializes entities through the
//!   types defined here, so the REST body, the stored document and the
//!   notification payload always agree.
//! - **Store-owned**: entities are owned by the document store; everything
//!   else treats them as immutable snapshots once read.

pub mod entities;
pub mod status;

pub use entities::*;
pub use status::*;

/// Collection holding [`EdgeNode`] documents.
pub const EDGE_NODES: &str = "edge_nodes";

/// Collection holding [`Workload`] documents.
pub const WORKLOADS: &str = "workloads";

/// Collection holding [`PerformanceMetric`] documents.
pub const PERFORMANCE_METRICS: &str = "performance_metrics";

/// Collection holding [`SecurityEvent`] documents.
pub const SECURITY_EVENTS: &str = "security_events";
