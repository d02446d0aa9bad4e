//! Threshold-based alert evaluation
//!
//! Evaluation is stateless: no alert history, no deduplication and no
//! auto-clear. Every recorded value is judged on its own.

use std::collections::HashMap;

use crate::recorder::names;
use crate::types::{Alert, AlertLevel, Threshold};

/// Warning/critical pairs keyed by metric name
#[derive(Debug, Clone)]
pub struct AlertThresholds {
    thresholds: HashMap<String, Threshold>,
}

impl AlertThresholds {
    /// Empty set: nothing alerts
    pub fn empty() -> Self {
        Self {
            thresholds: HashMap::new(),
        }
    }

    /// Built-in thresholds for the system and assistant metrics
    pub fn with_defaults() -> Self {
        let mut thresholds = Self::empty();
        thresholds.set(names::CPU_USAGE, 80.0, 95.0);
        thresholds.set(names::MEMORY_USAGE, 80.0, 95.0);
        thresholds.set(names::LLM_RESPONSE_TIME, 5.0, 10.0);
        thresholds.set(names::AGENT_EXECUTION_TIME, 30.0, 60.0);
        thresholds
    }

    /// Create or overwrite the pair for `name`. Ordering is not checked.
    pub fn set(&mut self, name: &str, warning: f64, critical: f64) {
        self.thresholds
            .insert(name.to_string(), Threshold::new(warning, critical));
    }

    pub fn remove(&mut self, name: &str) -> Option<Threshold> {
        self.thresholds.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Threshold> {
        self.thresholds.get(name).copied()
    }

    /// Layer `overrides` over the current pairs
    pub fn extend<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, Threshold)>,
    {
        self.thresholds.extend(overrides);
    }

    pub fn snapshot(&self) -> HashMap<String, Threshold> {
        self.thresholds.clone()
    }

    /// Judge one value; critical wins when both thresholds are met
    pub fn evaluate(&self, name: &str, value: f64) -> Option<Alert> {
        let threshold = self.thresholds.get(name)?;

        let level = if value >= threshold.critical {
            AlertLevel::Critical
        } else if value >= threshold.warning {
            AlertLevel::Warning
        } else {
            return None;
        };

        Some(Alert {
            metric_name: name.to_string(),
            level,
            value,
        })
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::with_defaults()
    }
}
