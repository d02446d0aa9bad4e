//! Pulse performance monitor
//!
//! Bounded, thread-safe, multi-metric time-series recorder for the desktop
//! assistant. Readings are kept per metric in capacity- and age-bounded
//! ring buffers, summarised on demand with a short-lived cache, checked
//! against warning/critical thresholds, and published to live subscribers.
//! A periodic sampler feeds host CPU, memory and disk usage.

pub mod alerts;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod monitor;
pub mod recorder;
pub mod sampler;
pub mod service;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use alerts::AlertThresholds;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use events::StatsUpdate;
pub use export::{ExportFormat, MetricsSnapshot};
pub use monitor::PerformanceMonitor;
pub use recorder::names;
pub use sampler::{ResourceProbe, Sampler, SysinfoProbe, TickReport};
pub use service::MonitorService;
pub use types::{
    Alert, AlertLevel, Metadata, MetricReading, MetricType, PerformanceStats, Threshold, Trend,
};
