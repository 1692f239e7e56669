//! Smart-city demo fleet.

use crate::domain::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use edge_bus::{EventType, MetricGenerator, MetricRanges, RandomMetricGenerator};
use edge_types::{EdgeNode, NodeStatus};
use serde::Serialize;
use tracing::info;

struct DemoNode {
    name: &'static str,
    location: &'static str,
    node_type: &'static str,
    ranges: MetricRanges,
}

fn demo_fleet() -> [DemoNode; 4] {
    [
        DemoNode {
            name: "Traffic Camera - Main St",
            location: "Main Street & 1st Ave",
            node_type: "traffic_camera",
            ranges: MetricRanges {
                cpu_usage: 20.0..60.0,
                memory_usage: 30.0..70.0,
                network_latency: 5.0..25.0,
            },
        },
        DemoNode {
            name: "Air Quality Sensor - Park",
            location: "Central Park",
            node_type: "air_quality_sensor",
            ranges: MetricRanges {
                cpu_usage: 10.0..40.0,
                memory_usage: 20.0..50.0,
                network_latency: 8.0..30.0,
            },
        },
        DemoNode {
            name: "Traffic Camera - Highway",
            location: "Highway 101 Junction",
            node_type: "traffic_camera",
            ranges: MetricRanges {
                cpu_usage: 25.0..65.0,
                memory_usage: 35.0..75.0,
                network_latency: 10.0..35.0,
            },
        },
        DemoNode {
            name: "Smart Streetlight Controller",
            location: "Downtown District",
            node_type: "general",
            ranges: MetricRanges {
                cpu_usage: 15.0..45.0,
                memory_usage: 25.0..55.0,
                network_latency: 5.0..20.0,
            },
        },
    ]
}

impl DemoNode {
    fn build(self) -> EdgeNode {
        let mut node = EdgeNode::new(self.name, self.location, self.node_type);
        let sample = RandomMetricGenerator::with_ranges(self.ranges).sample(&node.id);
        node.status = NodeStatus::Online;
        node.cpu_usage = sample.cpu_usage;
        node.memory_usage = sample.memory_usage;
        node.network_latency = sample.network_latency;
        node
    }
}

#[derive(Debug, Serialize)]
pub struct DemoSetup {
    pub message: String,
    pub nodes: Vec<EdgeNode>,
}

/// `POST /api/demo/setup-smart-city`: seed four online demo nodes.
pub async fn setup_smart_city(State(state): State<AppState>) -> Result<Json<DemoSetup>, ApiError> {
    let mut nodes = Vec::new();
    for demo in demo_fleet() {
        let node = demo.build();
        state.repo.insert_node(&node).await?;
        state.hub.notify(EventType::NodeCreated, &node).await;
        nodes.push(node);
    }
    info!(nodes = nodes.len(), "Smart-city demo fleet created");

    Ok(Json(DemoSetup {
        message: format!("Created {} demo edge nodes", nodes.len()),
        nodes,
    }))
}
