//! The performance monitor
//!
//! [`PerformanceMonitor`] owns the metric store, the stats cache and the
//! alert thresholds. All series and cache mutation happens under one store
//! mutex; notifications and alert evaluation run after that lock is
//! released so subscribers never hold up producers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::alerts::AlertThresholds;
use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::events::{EventChannels, StatsUpdate};
use crate::store::{MetricStore, StatsLookup};
use crate::types::{
    Alert, AlertLevel, Metadata, MetricReading, MetricType, PerformanceStats, Threshold,
};

/// Thread-safe metric recorder with cached statistics and alerting
pub struct PerformanceMonitor {
    store: Mutex<MetricStore>,
    thresholds: RwLock<AlertThresholds>,
    events: EventChannels,
    clock: Arc<dyn Clock>,
}

impl PerformanceMonitor {
    /// Create a monitor using wall-clock time
    pub fn new(config: &MonitorConfig) -> MonitorResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a monitor reading time from `clock`
    ///
    /// Fails when the configuration does not validate.
    pub fn with_clock(config: &MonitorConfig, clock: Arc<dyn Clock>) -> MonitorResult<Self> {
        config.validate()?;

        let mut thresholds = AlertThresholds::with_defaults();
        thresholds.extend(config.alerts.thresholds.clone());

        Ok(Self {
            store: Mutex::new(MetricStore::new(
                config.storage.capacity,
                config.retention(),
                config.cache_freshness(),
            )),
            thresholds: RwLock::new(thresholds),
            events: EventChannels::new(),
            clock,
        })
    }

    /// Record one reading stamped with the current time
    ///
    /// Never fails: a lost subscriber or an alert with no listener does not
    /// affect the stored reading.
    pub fn record(
        &self,
        metric_type: MetricType,
        name: &str,
        value: f64,
        unit: Option<&str>,
        metadata: Option<Metadata>,
    ) {
        let reading = MetricReading {
            timestamp: self.clock.now(),
            metric_type,
            name: name.to_string(),
            value,
            unit: unit.map(str::to_string),
            metadata: metadata.unwrap_or_default(),
        };

        let dropped = self.lock_store().insert(reading.clone());
        debug!(metric = name, value, dropped, "Recorded metric");

        self.events.publish_reading(reading);
        self.evaluate_alert(name, value);
    }

    /// Readings for `name` from the last `window_minutes` minutes
    pub fn get_recent(&self, name: &str, window_minutes: u32) -> Vec<MetricReading> {
        let since = self.clock.now() - Duration::minutes(i64::from(window_minutes));
        self.lock_store().recent(name, since)
    }

    /// Summary statistics for `name`, or `None` if nothing is retained
    pub fn get_stats(&self, name: &str) -> Option<PerformanceStats> {
        let now = self.clock.now();
        let lookup = self.lock_store().stats(name, now);

        match lookup {
            StatsLookup::Cached(stats) => Some(stats),
            StatsLookup::Computed(stats) => {
                debug!(metric = name, count = stats.count, trend = %stats.trend, "Recomputed stats");
                self.events.publish_stats(name, stats.clone());
                Some(stats)
            }
            StatsLookup::Missing => None,
        }
    }

    /// Stats for every known metric
    pub fn all_stats(&self) -> BTreeMap<String, PerformanceStats> {
        self.list_metric_names()
            .into_iter()
            .filter_map(|name| self.get_stats(&name).map(|stats| (name, stats)))
            .collect()
    }

    /// Drop data and cached stats for one metric, or for all when `name` is `None`
    pub fn clear(&self, name: Option<&str>) {
        let mut store = self.lock_store();
        match name {
            Some(name) => store.clear_metric(name),
            None => store.clear_all(),
        }
    }

    pub fn list_metric_names(&self) -> BTreeSet<String> {
        self.lock_store().metric_names()
    }

    /// Create or overwrite alert thresholds for `name`
    pub fn set_threshold(&self, name: &str, warning: f64, critical: f64) {
        self.write_thresholds().set(name, warning, critical);
    }

    pub fn remove_threshold(&self, name: &str) -> Option<Threshold> {
        self.write_thresholds().remove(name)
    }

    pub fn threshold(&self, name: &str) -> Option<Threshold> {
        self.read_thresholds().get(name)
    }

    pub fn thresholds(&self) -> HashMap<String, Threshold> {
        self.read_thresholds().snapshot()
    }

    pub fn subscribe_readings(&self) -> broadcast::Receiver<MetricReading> {
        self.events.subscribe_readings()
    }

    pub fn subscribe_stats(&self) -> broadcast::Receiver<StatsUpdate> {
        self.events.subscribe_stats()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.events.subscribe_alerts()
    }

    /// Readings currently retained for `name`
    pub fn series_len(&self, name: &str) -> usize {
        self.lock_store().series(name).map_or(0, |series| series.len())
    }

    pub fn capacity(&self) -> usize {
        self.lock_store().capacity()
    }

    pub fn retention(&self) -> Duration {
        self.lock_store().retention()
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    #[cfg(test)]
    pub(crate) fn has_cached_stats(&self, name: &str) -> bool {
        self.lock_store().has_cached_stats(name)
    }

    fn evaluate_alert(&self, name: &str, value: f64) {
        let alert = self.read_thresholds().evaluate(name, value);

        if let Some(alert) = alert {
            match alert.level {
                AlertLevel::Critical => {
                    error!(metric = name, value, "Critical performance alert");
                }
                AlertLevel::Warning => {
                    warn!(metric = name, value, "Performance warning");
                }
            }
            self.events.publish_alert(alert);
        }
    }

    // Every mutation leaves the store consistent, so poisoned guards are reused.

    fn lock_store(&self) -> MutexGuard<'_, MetricStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_thresholds(&self) -> std::sync::RwLockReadGuard<'_, AlertThresholds> {
        self.thresholds.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_thresholds(&self) -> std::sync::RwLockWriteGuard<'_, AlertThresholds> {
        self.thresholds.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("metrics", &self.list_metric_names())
            .finish_non_exhaustive()
    }
}
