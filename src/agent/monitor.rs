//! Metric sinks.

use tracing::info;

use crate::core::Metrics;

use super::traits::Monitor;

/// Discards every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn record_metrics(&mut self, _metrics: &Metrics) {}
}

/// Emits each record as a `tracing` event under the run name.
#[derive(Clone, Debug)]
pub struct TracingMonitor {
    name: String,
}

impl TracingMonitor {
    /// Create a monitor for the named run.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Monitor for TracingMonitor {
    fn record_metrics(&mut self, metrics: &Metrics) {
        // Sorted so log lines are stable between runs.
        let mut entries: Vec<_> = metrics.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let rendered = entries
            .iter()
            .map(|(k, v)| format!("{}={:.4}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        info!(run = %self.name, "{}", rendered);
    }
}

/// Keeps every record in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryMonitor {
    records: Vec<Metrics>,
}

impl MemoryMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in arrival order.
    pub fn records(&self) -> &[Metrics] {
        &self.records
    }

    /// Every recorded value of one metric, in arrival order.
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|m| m.get(name).copied())
            .collect()
    }

    /// Most recent value of one metric.
    pub fn last(&self, name: &str) -> Option<f64> {
        self.records.iter().rev().find_map(|m| m.get(name).copied())
    }
}

impl Monitor for MemoryMonitor {
    fn record_metrics(&mut self, metrics: &Metrics) {
        self.records.push(metrics.clone());
    }
}
