//! Core value types shared by the store, aggregator and alert evaluator
//!
//! Everything here crosses the monitor boundary by value: readings, stats
//! and alerts handed to subscribers are copies and never alias store data.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Auxiliary data attached to a reading
pub type Metadata = HashMap<String, serde_json::Value>;

/// Category of a recorded metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    AgentExecution,
    LlmResponse,
    DatabaseQuery,
    UiResponse,
    EmailProcessing,
    SystemResource,
    MemoryUsage,
    CpuUsage,
    Custom,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricType::AgentExecution => write!(f, "agent_execution"),
            MetricType::LlmResponse => write!(f, "llm_response"),
            MetricType::DatabaseQuery => write!(f, "database_query"),
            MetricType::UiResponse => write!(f, "ui_response"),
            MetricType::EmailProcessing => write!(f, "email_processing"),
            MetricType::SystemResource => write!(f, "system_resource"),
            MetricType::MemoryUsage => write!(f, "memory_usage"),
            MetricType::CpuUsage => write!(f, "cpu_usage"),
            MetricType::Custom => write!(f, "custom"),
        }
    }
}

/// One timestamped observation of a named metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// When the reading was recorded
    pub timestamp: DateTime<Utc>,

    /// Metric category
    pub metric_type: MetricType,

    /// Series key
    pub name: String,

    /// Observed value
    pub value: f64,

    /// Unit of measurement, if any
    pub unit: Option<String>,

    /// Producer-specific auxiliary data
    #[serde(default)]
    pub metadata: Metadata,
}

/// Coarse direction of a metric's recent values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Decreasing => write!(f, "decreasing"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Summary statistics for one metric at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Value of the most recent reading
    pub current: f64,

    /// Mean over all retained readings
    pub average: f64,

    /// Smallest retained value
    pub minimum: f64,

    /// Largest retained value
    pub maximum: f64,

    /// Number of retained readings
    pub count: usize,

    /// Direction of recent values
    pub trend: Trend,
}

/// Severity of a threshold crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Alert emitted when a recorded value crosses a configured threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub metric_name: String,
    pub level: AlertLevel,
    pub value: f64,
}

/// Warning/critical pair for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
}

impl Threshold {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}
