//! Typed access to the edge fabric collections.
//!
//! Entities go in and out through serde; the store only sees documents.
//! Timestamps are written in the same RFC 3339 form chrono's serde uses so
//! sorting and parsing agree regardless of which path wrote them.

use crate::domain::LimitsConfig;
use chrono::{DateTime, SecondsFormat, Utc};
use edge_store::{
    from_document, to_document, Accumulator, Document, DocumentStore, Filter, FindOptions, Group,
    Patch, Stage, StoreError,
};
use edge_types::{
    EdgeNode, EdgeNodeUpdate, NodeStatus, PerformanceMetric, SecurityEvent, SystemAnalytics,
    Workload, WorkloadStatus, EDGE_NODES, PERFORMANCE_METRICS, SECURITY_EVENTS, WORKLOADS,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn by_id(id: &str) -> Filter {
    Filter::eq("id", id)
}

fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> Result<Vec<T>, StoreError> {
    docs.into_iter().map(from_document).collect()
}

/// Repository over the four edge fabric collections.
#[derive(Clone)]
pub struct EdgeRepository {
    store: Arc<dyn DocumentStore>,
    limits: LimitsConfig,
}

impl EdgeRepository {
    pub fn new(store: Arc<dyn DocumentStore>, limits: LimitsConfig) -> Self {
        Self { store, limits }
    }

    // =========================================================================
    // EDGE NODES
    // =========================================================================

    pub async fn insert_node(&self, node: &EdgeNode) -> Result<(), StoreError> {
        self.store.insert(EDGE_NODES, to_document(node)?).await
    }

    pub async fn list_nodes(&self) -> Result<Vec<EdgeNode>, StoreError> {
        let docs = self
            .store
            .find_with(EDGE_NODES, &Filter::all(), &FindOptions::limit(self.limits.list_limit))
            .await?;
        decode_all(docs)
    }

    pub async fn get_node(&self, id: &str) -> Result<Option<EdgeNode>, StoreError> {
        self.store
            .find_one(EDGE_NODES, &by_id(id))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Apply the present fields of `update` and refresh the heartbeat.
    ///
    /// Returns the updated node, or `None` if no node has this id.
    pub async fn update_node(
        &self,
        id: &str,
        update: &EdgeNodeUpdate,
    ) -> Result<Option<EdgeNode>, StoreError> {
        let patch = Patch::set_all(to_document(update)?)
            .set("last_heartbeat", timestamp_value(Utc::now()));
        if self.store.update(EDGE_NODES, &by_id(id), &patch).await? == 0 {
            return Ok(None);
        }
        self.get_node(id).await
    }

    /// Returns whether a node was deleted.
    pub async fn delete_node(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.store.delete(EDGE_NODES, &by_id(id)).await? > 0)
    }

    pub async fn increment_workload_count(&self, node_id: &str) -> Result<(), StoreError> {
        self.store
            .update(EDGE_NODES, &by_id(node_id), &Patch::new().inc("workload_count", 1))
            .await?;
        Ok(())
    }

    // =========================================================================
    // WORKLOADS
    // =========================================================================

    pub async fn insert_workload(&self, workload: &Workload) -> Result<(), StoreError> {
        self.store.insert(WORKLOADS, to_document(workload)?).await
    }

    pub async fn list_workloads(&self) -> Result<Vec<Workload>, StoreError> {
        self.workloads_matching(Filter::all()).await
    }

    pub async fn list_workloads_for_node(&self, node_id: &str) -> Result<Vec<Workload>, StoreError> {
        self.workloads_matching(Filter::eq("node_id", node_id)).await
    }

    async fn workloads_matching(&self, filter: Filter) -> Result<Vec<Workload>, StoreError> {
        let docs = self
            .store
            .find_with(WORKLOADS, &filter, &FindOptions::limit(self.limits.list_limit))
            .await?;
        decode_all(docs)
    }

    pub async fn get_workload(&self, id: &str) -> Result<Option<Workload>, StoreError> {
        self.store
            .find_one(WORKLOADS, &by_id(id))
            .await?
            .map(from_document)
            .transpose()
    }

    /// Move a workload to `status`, stamping the lifecycle timestamps.
    ///
    /// `running` stamps `deployed_at`; `completed` and `failed` stamp
    /// `completed_at` and record `execution_time` when given.
    pub async fn update_workload_status(
        &self,
        id: &str,
        status: WorkloadStatus,
        execution_time: Option<f64>,
    ) -> Result<Option<Workload>, StoreError> {
        let now = timestamp_value(Utc::now());
        let mut patch = Patch::new().set("status", status.as_str());
        if status == WorkloadStatus::Running {
            patch = patch.set("deployed_at", now);
        } else if status.is_finished() {
            patch = patch.set("completed_at", now);
            if let Some(seconds) = execution_time {
                patch = patch.set("execution_time", seconds);
            }
        }

        if self.store.update(WORKLOADS, &by_id(id), &patch).await? == 0 {
            return Ok(None);
        }
        self.get_workload(id).await
    }

    // =========================================================================
    // TELEMETRY
    // =========================================================================

    pub async fn insert_metric(&self, metric: &PerformanceMetric) -> Result<(), StoreError> {
        self.store.insert(PERFORMANCE_METRICS, to_document(metric)?).await
    }

    /// Newest samples for a node first.
    pub async fn metrics_for_node(
        &self,
        node_id: &str,
        limit: usize,
    ) -> Result<Vec<PerformanceMetric>, StoreError> {
        let docs = self
            .store
            .find_with(
                PERFORMANCE_METRICS,
                &Filter::eq("node_id", node_id),
                &FindOptions::newest_first("timestamp", limit),
            )
            .await?;
        decode_all(docs)
    }

    pub async fn insert_security_event(&self, event: &SecurityEvent) -> Result<(), StoreError> {
        self.store.insert(SECURITY_EVENTS, to_document(event)?).await
    }

    /// Newest events first.
    pub async fn security_events(&self, limit: usize) -> Result<Vec<SecurityEvent>, StoreError> {
        let docs = self
            .store
            .find_with(
                SECURITY_EVENTS,
                &Filter::all(),
                &FindOptions::newest_first("timestamp", limit),
            )
            .await?;
        decode_all(docs)
    }

    // =========================================================================
    // ANALYTICS
    // =========================================================================

    /// Fleet-wide aggregate. Averages cover online nodes only.
    pub async fn analytics(&self) -> Result<SystemAnalytics, StoreError> {
        let online = Filter::eq("status", NodeStatus::Online.as_str());

        let total_nodes = self.store.count(EDGE_NODES, &Filter::all()).await?;
        let active_nodes = self.store.count(EDGE_NODES, &online).await?;
        let total_workloads = self.store.count(WORKLOADS, &Filter::all()).await?;
        let running_workloads = self.count_workloads(WorkloadStatus::Running).await?;

        let pipeline = vec![
            Stage::Match(online),
            Stage::Group(
                Group::new()
                    .with("avg_cpu", Accumulator::Avg("cpu_usage".into()))
                    .with("avg_memory", Accumulator::Avg("memory_usage".into()))
                    .with("avg_latency", Accumulator::Avg("network_latency".into())),
            ),
        ];
        let rows = self.store.aggregate(EDGE_NODES, &pipeline).await?;
        let average = |field: &str| {
            rows.first()
                .and_then(|row| row.get(field))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };

        let completed = self.count_workloads(WorkloadStatus::Completed).await?;
        let failed = self.count_workloads(WorkloadStatus::Failed).await?;
        let finished = completed + failed;
        let success_rate = if finished > 0 {
            completed as f64 / finished as f64 * 100.0
        } else {
            100.0
        };

        let security_incidents = self
            .store
            .count(SECURITY_EVENTS, &Filter::eq("resolved", false))
            .await?;

        Ok(SystemAnalytics {
            total_nodes,
            active_nodes,
            total_workloads,
            running_workloads,
            average_cpu_usage: average("avg_cpu"),
            average_memory_usage: average("avg_memory"),
            average_latency: average("avg_latency"),
            success_rate,
            security_incidents,
        })
    }

    async fn count_workloads(&self, status: WorkloadStatus) -> Result<u64, StoreError> {
        self.store
            .count(WORKLOADS, &Filter::eq("status", status.as_str()))
            .await
    }
}
