//! Metric generation strategy for the periodic publisher.

use crate::events::MetricsSample;
use rand::Rng;
use std::ops::Range;

/// Produces one metric sample for a node.
pub trait MetricGenerator: Send + Sync {
    fn sample(&self, node_id: &str) -> MetricsSample;
}

/// Inclusive-exclusive bounds for each synthesized value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRanges {
    pub cpu_usage: Range<f64>,
    pub memory_usage: Range<f64>,
    pub network_latency: Range<f64>,
}

impl Default for MetricRanges {
    fn default() -> Self {
        Self {
            cpu_usage: 10.0..80.0,
            memory_usage: 20.0..90.0,
            network_latency: 5.0..50.0,
        }
    }
}

/// Uniform random samples within [`MetricRanges`], rounded to 0.1.
#[derive(Debug, Clone, Default)]
pub struct RandomMetricGenerator {
    ranges: MetricRanges,
}

impl RandomMetricGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranges(ranges: MetricRanges) -> Self {
        Self { ranges }
    }
}

impl MetricGenerator for RandomMetricGenerator {
    fn sample(&self, node_id: &str) -> MetricsSample {
        let mut rng = rand::thread_rng();
        MetricsSample {
            node_id: node_id.to_string(),
            cpu_usage: draw(&mut rng, &self.ranges.cpu_usage),
            memory_usage: draw(&mut rng, &self.ranges.memory_usage),
            network_latency: draw(&mut rng, &self.ranges.network_latency),
        }
    }
}

/// Draw from `range`, rounded to one decimal and kept inside the bounds.
pub(crate) fn draw<R: Rng + ?Sized>(rng: &mut R, range: &Range<f64>) -> f64 {
    if range.is_empty() {
        return range.start;
    }
    let raw = rng.gen_range(range.clone());
    ((raw * 10.0).round() / 10.0).clamp(range.start, range.end)
}
