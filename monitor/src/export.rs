//! Snapshot export of the current statistics
//!
//! Renders every metric's summary as JSON or as Prometheus text exposition
//! for external dashboards.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::monitor::PerformanceMonitor;
use crate::types::{PerformanceStats, Threshold};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Prometheus,
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "prometheus" | "prom" => Ok(ExportFormat::Prometheus),
            _ => Err(ExportError::UnsupportedFormat { format: s.to_string() }),
        }
    }
}

/// Point-in-time view of every metric's stats and the active thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub metrics: BTreeMap<String, PerformanceStats>,
    pub thresholds: BTreeMap<String, Threshold>,
}

impl PerformanceMonitor {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: self.now(),
            metrics: self.all_stats(),
            thresholds: self.thresholds().into_iter().collect(),
        }
    }

    /// Export metrics in the specified format
    pub fn export_metrics(&self, format: ExportFormat) -> ExportResult<String> {
        let snapshot = self.snapshot();

        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&snapshot)
                .map_err(|e| ExportError::EncodingFailed { reason: e.to_string() }),
            ExportFormat::Prometheus => encode_prometheus(&snapshot),
        }
    }
}

#[cfg(feature = "metrics")]
fn encode_prometheus(snapshot: &MetricsSnapshot) -> ExportResult<String> {
    use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

    use crate::types::Trend;

    let encoding_failed = |e: prometheus::Error| ExportError::EncodingFailed { reason: e.to_string() };

    let registry = Registry::new();
    let gauge = |name: &str, help: &str| -> ExportResult<GaugeVec> {
        let gauge = GaugeVec::new(Opts::new(name, help), &["metric"]).map_err(encoding_failed)?;
        registry
            .register(Box::new(gauge.clone()))
            .map_err(encoding_failed)?;
        Ok(gauge)
    };

    let current = gauge("pulse_metric_current", "Most recent recorded value")?;
    let average = gauge("pulse_metric_average", "Mean over retained readings")?;
    let minimum = gauge("pulse_metric_minimum", "Smallest retained value")?;
    let maximum = gauge("pulse_metric_maximum", "Largest retained value")?;
    let samples = gauge("pulse_metric_samples", "Number of retained readings")?;
    let trend = gauge("pulse_metric_trend", "Trend direction (-1 decreasing, 0 stable, 1 increasing)")?;

    for (name, stats) in &snapshot.metrics {
        let labels = [name.as_str()];
        current.with_label_values(&labels).set(stats.current);
        average.with_label_values(&labels).set(stats.average);
        minimum.with_label_values(&labels).set(stats.minimum);
        maximum.with_label_values(&labels).set(stats.maximum);
        samples.with_label_values(&labels).set(stats.count as f64);
        trend.with_label_values(&labels).set(match stats.trend {
            Trend::Increasing => 1.0,
            Trend::Decreasing => -1.0,
            Trend::Stable => 0.0,
        });
    }

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .map_err(encoding_failed)?;

    String::from_utf8(buffer).map_err(|e| ExportError::EncodingFailed { reason: e.to_string() })
}

#[cfg(not(feature = "metrics"))]
fn encode_prometheus(_snapshot: &MetricsSnapshot) -> ExportResult<String> {
    Err(ExportError::UnsupportedFormat {
        format: "prometheus (built without the metrics feature)".to_string(),
    })
}
