//! Notification channels for live consumers
//!
//! Dashboards subscribe to three independent broadcast channels: new
//! readings, recomputed stats and alerts. Payloads are owned copies, so a
//! slow or absent subscriber never affects the store. A receiver that falls
//! more than [`EVENT_CHANNEL_CAPACITY`] messages behind observes
//! `RecvError::Lagged` and skips ahead.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Alert, MetricReading, PerformanceStats};

/// Buffered messages per channel
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Stats recomputed for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsUpdate {
    pub metric_name: String,
    pub stats: PerformanceStats,
}

/// Senders for the three notification channels
#[derive(Debug)]
pub struct EventChannels {
    readings: broadcast::Sender<MetricReading>,
    stats: broadcast::Sender<StatsUpdate>,
    alerts: broadcast::Sender<Alert>,
}

impl EventChannels {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (readings, _) = broadcast::channel(capacity);
        let (stats, _) = broadcast::channel(capacity);
        let (alerts, _) = broadcast::channel(capacity);

        Self {
            readings,
            stats,
            alerts,
        }
    }

    pub fn subscribe_readings(&self) -> broadcast::Receiver<MetricReading> {
        self.readings.subscribe()
    }

    pub fn subscribe_stats(&self) -> broadcast::Receiver<StatsUpdate> {
        self.stats.subscribe()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    // Sends fail only when there are no subscribers.

    pub fn publish_reading(&self, reading: MetricReading) {
        let _ = self.readings.send(reading);
    }

    pub fn publish_stats(&self, metric_name: &str, stats: PerformanceStats) {
        let _ = self.stats.send(StatsUpdate {
            metric_name: metric_name.to_string(),
            stats,
        });
    }

    pub fn publish_alert(&self, alert: Alert) {
        let _ = self.alerts.send(alert);
    }
}

impl Default for EventChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertLevel, Trend};

    #[test]
    fn test_publish_without_subscribers() {
        let channels = EventChannels::new();
        channels.publish_alert(Alert {
            metric_name: "cpu_usage".to_string(),
            level: AlertLevel::Warning,
            value: 85.0,
        });
    }

    #[test]
    fn test_each_subscriber_gets_a_copy() {
        let channels = EventChannels::new();
        let mut first = channels.subscribe_stats();
        let mut second = channels.subscribe_stats();

        let stats = PerformanceStats {
            current: 1.0,
            average: 1.0,
            minimum: 1.0,
            maximum: 1.0,
            count: 1,
            trend: Trend::Stable,
        };
        channels.publish_stats("x", stats.clone());

        assert_eq!(first.try_recv().unwrap().stats, stats);
        assert_eq!(second.try_recv().unwrap().metric_name, "x");
    }

    #[test]
    fn test_slow_subscriber_lags() {
        let channels = EventChannels::with_capacity(2);
        let mut alerts = channels.subscribe_alerts();

        for value in [1.0, 2.0, 3.0] {
            channels.publish_alert(Alert {
                metric_name: "x".to_string(),
                level: AlertLevel::Critical,
                value,
            });
        }

        assert!(matches!(
            alerts.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
        assert_eq!(alerts.try_recv().unwrap().value, 2.0);
    }
}
