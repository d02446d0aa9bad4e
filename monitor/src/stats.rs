//! Statistical summaries and the short-lived stats cache
//!
//! Recomputation is linear in series length, which the store caps, so the
//! cache only absorbs repeated queries (a dashboard polling every second).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::types::{PerformanceStats, Trend};

/// Minimum retained readings before a trend is classified
pub const TREND_MIN_READINGS: usize = 10;

/// Readings averaged at each end of the series for trend detection
pub const TREND_WINDOW: usize = 5;

/// Relative change needed to leave `Trend::Stable`
pub const TREND_TOLERANCE: f64 = 0.1;

/// Summarise a chronologically ordered slice of values
///
/// Returns `None` for an empty slice.
pub fn compute_stats(values: &[f64]) -> Option<PerformanceStats> {
    let current = *values.last()?;

    let sum: f64 = values.iter().sum();
    let minimum = values.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(PerformanceStats {
        current,
        average: sum / values.len() as f64,
        minimum,
        maximum,
        count: values.len(),
        trend: detect_trend(values),
    })
}

/// Compare the mean of the newest readings with the mean of the oldest retained ones
///
/// The baseline is whatever is currently retained, so it slides forward as
/// old readings are evicted or pruned.
pub fn detect_trend(values: &[f64]) -> Trend {
    if values.len() < TREND_MIN_READINGS {
        return Trend::Stable;
    }

    let older = mean(&values[..TREND_WINDOW]);
    let recent = mean(&values[values.len() - TREND_WINDOW..]);

    if recent > older * (1.0 + TREND_TOLERANCE) {
        Trend::Increasing
    } else if recent < older * (1.0 - TREND_TOLERANCE) {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone)]
struct CachedStats {
    stats: PerformanceStats,
    computed_at: DateTime<Utc>,
}

/// Per-metric cache of computed summaries
#[derive(Debug)]
pub struct StatsCache {
    entries: HashMap<String, CachedStats>,
    freshness: Duration,
}

impl StatsCache {
    pub fn new(freshness: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            freshness,
        }
    }

    /// Cached stats for `name` if computed less than the freshness window ago
    pub fn get_fresh(&self, name: &str, now: DateTime<Utc>) -> Option<PerformanceStats> {
        self.entries
            .get(name)
            .filter(|entry| now - entry.computed_at < self.freshness)
            .map(|entry| entry.stats.clone())
    }

    pub fn insert(&mut self, name: &str, stats: PerformanceStats, now: DateTime<Utc>) {
        self.entries.insert(
            name.to_string(),
            CachedStats {
                stats,
                computed_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
