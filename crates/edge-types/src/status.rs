//! # Status Vocabularies
//!
//! Closed sets of lifecycle values. These are serialized as lowercase
//! snake_case strings so stored documents can be filtered on them directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operational status of an edge node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Reachable and reporting; only online nodes receive synthetic metrics.
    Online,
    /// Not reachable.
    #[default]
    Offline,
    /// Taken out of rotation by an operator.
    Maintenance,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Maintenance => "maintenance",
        }
    }
}

/// Security posture of an edge node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityStatus {
    #[default]
    Secure,
    Warning,
    Vulnerable,
}

/// Lifecycle of a workload.
///
/// ```text
/// Pending ──→ Running ──→ Completed
///                    └──→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the workload has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Scheduling priority of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Severity of a security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&NodeStatus::Online).unwrap(), "\"online\"");
        assert_eq!(
            serde_json::to_string(&WorkloadStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }

    #[test]
    fn test_as_str_matches_serde() {
        for status in [NodeStatus::Online, NodeStatus::Offline, NodeStatus::Maintenance] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_finished_workloads() {
        assert!(WorkloadStatus::Completed.is_finished());
        assert!(WorkloadStatus::Failed.is_finished());
        assert!(!WorkloadStatus::Running.is_finished());
        assert!(!WorkloadStatus::Pending.is_finished());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(NodeStatus::default(), NodeStatus::Offline);
        assert_eq!(WorkloadStatus::default(), WorkloadStatus::Pending);
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(SecurityStatus::default(), SecurityStatus::Secure);
    }
}
