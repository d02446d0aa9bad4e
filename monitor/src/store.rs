//! Bounded per-metric storage
//!
//! Each metric name owns a ring buffer of readings capped by count and by
//! age. The store itself is not synchronised; [`crate::PerformanceMonitor`]
//! keeps it behind a single mutex together with the stats cache.

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::stats::{compute_stats, StatsCache};
use crate::types::{MetricReading, PerformanceStats};

/// Time-ordered, capacity-bounded history for one metric
#[derive(Debug)]
pub struct MetricSeries {
    readings: VecDeque<MetricReading>,
    capacity: usize,
}

impl MetricSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest beyond capacity, then prune
    /// everything older than `cutoff`. Returns how many readings were dropped.
    pub fn push(&mut self, reading: MetricReading, cutoff: DateTime<Utc>) -> usize {
        self.readings.push_back(reading);

        let mut dropped = 0;
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
            dropped += 1;
        }

        dropped + self.prune_before(cutoff)
    }

    /// Drop readings stamped before `cutoff` from the front
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut pruned = 0;
        while self
            .readings
            .front()
            .is_some_and(|reading| reading.timestamp < cutoff)
        {
            self.readings.pop_front();
            pruned += 1;
        }
        pruned
    }

    /// Copies of readings stamped at or after `since`
    pub fn since(&self, since: DateTime<Utc>) -> Vec<MetricReading> {
        // readings are chronological, so skip the expired prefix
        let start = self.readings.partition_point(|reading| reading.timestamp < since);
        self.readings.range(start..).cloned().collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|reading| reading.value).collect()
    }

    pub fn latest(&self) -> Option<&MetricReading> {
        self.readings.back()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// All series plus the stats cache
#[derive(Debug)]
pub struct MetricStore {
    series: HashMap<String, MetricSeries>,
    cache: StatsCache,
    capacity: usize,
    retention: Duration,
}

/// Outcome of a stats lookup
#[derive(Debug, Clone, PartialEq)]
pub enum StatsLookup {
    /// Served from the cache
    Cached(PerformanceStats),
    /// Recomputed from the series and cached
    Computed(PerformanceStats),
    /// No readings retained for the metric
    Missing,
}

impl MetricStore {
    pub fn new(capacity: usize, retention: Duration, cache_freshness: Duration) -> Self {
        Self {
            series: HashMap::new(),
            cache: StatsCache::new(cache_freshness),
            capacity,
            retention,
        }
    }

    /// Insert a reading into its series and invalidate that metric's cached stats
    pub fn insert(&mut self, reading: MetricReading) -> usize {
        let cutoff = reading.timestamp - self.retention;
        let name = reading.name.clone();
        let capacity = self.capacity;

        let dropped = self
            .series
            .entry(name.clone())
            .or_insert_with(|| MetricSeries::new(capacity))
            .push(reading, cutoff);

        self.cache.invalidate(&name);
        dropped
    }

    /// Readings for `name` stamped at or after `since`
    pub fn recent(&self, name: &str, since: DateTime<Utc>) -> Vec<MetricReading> {
        self.series
            .get(name)
            .map(|series| series.since(since))
            .unwrap_or_default()
    }

    /// Cached stats when fresh, otherwise recompute over the retained series
    pub fn stats(&mut self, name: &str, now: DateTime<Utc>) -> StatsLookup {
        if let Some(stats) = self.cache.get_fresh(name, now) {
            return StatsLookup::Cached(stats);
        }

        let computed = self
            .series
            .get(name)
            .and_then(|series| compute_stats(&series.values()));

        match computed {
            Some(stats) => {
                self.cache.insert(name, stats.clone(), now);
                StatsLookup::Computed(stats)
            }
            None => StatsLookup::Missing,
        }
    }

    /// Remove one metric's series and cached stats
    pub fn clear_metric(&mut self, name: &str) {
        self.series.remove(name);
        self.cache.invalidate(name);
    }

    /// Remove every series and cached stats entry
    pub fn clear_all(&mut self) {
        self.series.clear();
        self.cache.clear();
    }

    pub fn metric_names(&self) -> BTreeSet<String> {
        self.series.keys().cloned().collect()
    }

    pub fn series(&self, name: &str) -> Option<&MetricSeries> {
        self.series.get(name)
    }

    pub fn has_cached_stats(&self, name: &str) -> bool {
        self.cache.contains(name)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricType, Metadata};

    fn reading(name: &str, value: f64, timestamp: DateTime<Utc>) -> MetricReading {
        MetricReading {
            timestamp,
            metric_type: MetricType::Custom,
            name: name.to_string(),
            value,
            unit: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_series_capacity_keeps_most_recent() {
        let now = Utc::now();
        let cutoff = now - Duration::hours(1);
        let mut series = MetricSeries::new(3);

        for i in 0..5 {
            series.push(reading("x", i as f64, now), cutoff);
        }

        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_series_prunes_expired_front() {
        let start = Utc::now();
        let mut series = MetricSeries::new(10);

        series.push(reading("x", 1.0, start), start - Duration::hours(1));
        series.push(reading("x", 2.0, start + Duration::minutes(30)), start - Duration::hours(1));
        assert_eq!(series.len(), 2);

        let later = start + Duration::minutes(90);
        let dropped = series.push(reading("x", 3.0, later), later - Duration::hours(1));
        assert_eq!(dropped, 1);
        assert_eq!(series.values(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_series_since_is_inclusive() {
        let start = Utc::now();
        let mut series = MetricSeries::new(10);
        let cutoff = start - Duration::hours(24);

        for minute in 0..5 {
            series.push(reading("x", minute as f64, start + Duration::minutes(minute)), cutoff);
        }

        let recent = series.since(start + Duration::minutes(3));
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].value, 3.0);
        assert_eq!(series.latest().map(|r| r.value), Some(4.0));
    }

    #[test]
    fn test_store_insert_invalidates_cache() {
        let now = Utc::now();
        let mut store = MetricStore::new(100, Duration::hours(24), Duration::seconds(30));

        store.insert(reading("x", 1.0, now));
        assert!(matches!(store.stats("x", now), StatsLookup::Computed(_)));
        assert!(matches!(store.stats("x", now), StatsLookup::Cached(_)));
        assert!(store.has_cached_stats("x"));

        store.insert(reading("x", 3.0, now));
        assert!(!store.has_cached_stats("x"));
        match store.stats("x", now) {
            StatsLookup::Computed(stats) => {
                assert_eq!(stats.current, 3.0);
                assert_eq!(stats.count, 2);
            }
            other => panic!("expected recomputation, got {:?}", other),
        }
    }

    #[test]
    fn test_store_unknown_metric() {
        let now = Utc::now();
        let mut store = MetricStore::new(100, Duration::hours(24), Duration::seconds(30));
        assert_eq!(store.stats("missing", now), StatsLookup::Missing);
        assert!(store.recent("missing", now - Duration::hours(1)).is_empty());
    }

    #[test]
    fn test_store_clear() {
        let now = Utc::now();
        let mut store = MetricStore::new(100, Duration::hours(24), Duration::seconds(30));
        store.insert(reading("a", 1.0, now));
        store.insert(reading("b", 2.0, now));
        store.stats("a", now);
        store.stats("b", now);

        store.clear_metric("a");
        assert!(store.series("a").is_none());
        assert!(!store.has_cached_stats("a"));
        assert!(store.has_cached_stats("b"));
        assert_eq!(store.metric_names().into_iter().collect::<Vec<_>>(), vec!["b".to_string()]);

        store.clear_all();
        assert!(store.metric_names().is_empty());
        assert!(!store.has_cached_stats("b"));
    }
}
