//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Fleet**: `EdgeNode` with its create/update bodies
//! - **Scheduling**: `Workload` with its create body
//! - **Telemetry**: `PerformanceMetric`, `SecurityEvent`
//! - **Reporting**: `SystemAnalytics`

use crate::status::{NodeStatus, Priority, SecurityStatus, Severity, WorkloadStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default Kubernetes distribution reported by freshly registered nodes.
pub const DEFAULT_KUBERNETES_VERSION: &str = "k3s-1.28";

/// Generate a new entity id (random UUID v4, hyphenated).
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_kubernetes_version() -> String {
    DEFAULT_KUBERNETES_VERSION.to_string()
}

// =============================================================================
// CLUSTER A: THE FLEET
// =============================================================================

/// An edge compute node running a lightweight Kubernetes distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeNode {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Free-form class of device (`traffic_camera`, `air_quality_sensor`, `general`).
    pub node_type: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub memory_usage: f64,
    #[serde(default)]
    pub network_latency: f64,
    #[serde(default = "default_kubernetes_version")]
    pub kubernetes_version: String,
    pub last_heartbeat: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub security_status: SecurityStatus,
    #[serde(default)]
    pub workload_count: u32,
}

impl EdgeNode {
    /// Register a new node. It starts offline with zeroed usage.
    pub fn new(name: impl Into<String>, location: impl Into<String>, node_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_entity_id(),
            name: name.into(),
            location: location.into(),
            node_type: node_type.into(),
            status: NodeStatus::Offline,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            network_latency: 0.0,
            kubernetes_version: default_kubernetes_version(),
            last_heartbeat: now,
            created_at: now,
            security_status: SecurityStatus::Secure,
            workload_count: 0,
        }
    }
}

impl From<EdgeNodeCreate> for EdgeNode {
    fn from(body: EdgeNodeCreate) -> Self {
        Self::new(body.name, body.location, body.node_type)
    }
}

/// Body of `POST /api/edge-nodes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeNodeCreate {
    pub name: String,
    pub location: String,
    pub node_type: String,
}

/// Body of `PUT /api/edge-nodes/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeNodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_latency: Option<f64>,
}

// =============================================================================
// CLUSTER B: SCHEDULING
// =============================================================================

/// A unit of work deployed onto a single edge node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    pub name: String,
    pub description: String,
    pub node_id: String,
    /// Free-form class of work (`ai_analytics`, `monitoring`, `data_processing`).
    pub workload_type: String,
    #[serde(default)]
    pub status: WorkloadStatus,
    pub cpu_request: f64,
    pub memory_request: f64,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_time: Option<f64>,
}

impl From<WorkloadCreate> for Workload {
    fn from(body: WorkloadCreate) -> Self {
        Self {
            id: new_entity_id(),
            name: body.name,
            description: body.description,
            node_id: body.node_id,
            workload_type: body.workload_type,
            status: WorkloadStatus::Pending,
            cpu_request: body.cpu_request,
            memory_request: body.memory_request,
            priority: body.priority.unwrap_or_default(),
            created_at: Utc::now(),
            deployed_at: None,
            completed_at: None,
            execution_time: None,
        }
    }
}

/// Body of `POST /api/workloads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadCreate {
    pub name: String,
    pub description: String,
    pub node_id: String,
    pub workload_type: String,
    pub cpu_request: f64,
    pub memory_request: f64,
    #[serde(default)]
    pub priority: Option<Priority>,
}

// =============================================================================
// CLUSTER C: TELEMETRY
// =============================================================================

/// A performance sample reported for a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetric {
    #[serde(default = "new_entity_id")]
    pub id: String,
    pub node_id: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub network_latency: f64,
    pub deployment_latency: f64,
    pub success_rate: f64,
}

/// A security-relevant occurrence on a node (mTLS failure, RBAC violation, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    #[serde(default = "new_entity_id")]
    pub id: String,
    pub node_id: String,
    pub event_type: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

// =============================================================================
// CLUSTER D: REPORTING
// =============================================================================

/// Fleet-wide aggregate returned by `GET /api/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemAnalytics {
    pub total_nodes: u64,
    pub active_nodes: u64,
    pub total_workloads: u64,
    pub running_workloads: u64,
    pub average_cpu_usage: f64,
    pub average_memory_usage: f64,
    pub average_latency: f64,
    /// Percentage of finished workloads that completed; 100 when none finished.
    pub success_rate: f64,
    /// Unresolved security events.
    pub security_incidents: u64,
}
