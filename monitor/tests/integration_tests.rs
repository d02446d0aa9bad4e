//! End-to-end tests for the monitor through its public API

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use pulse_monitor::{
    error::{ConfigError, ProbeError, ProbeResult},
    names,
    sampler::{DiskUsage, MemoryUsage},
    AlertLevel, ExportFormat, ManualClock, MonitorConfig, MonitorService, PerformanceMonitor,
    ResourceProbe, Threshold, Trend,
};
use tempfile::TempDir;

/// Test helper to create a monitor on a manual clock
fn create_test_monitor(config: MonitorConfig) -> (PerformanceMonitor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let monitor = PerformanceMonitor::with_clock(&config, clock.clone()).unwrap();
    (monitor, clock)
}

struct StaticProbe;

impl ResourceProbe for StaticProbe {
    fn cpu_percent(&self) -> ProbeResult<f64> {
        Ok(97.0)
    }

    fn memory(&self) -> ProbeResult<MemoryUsage> {
        Ok(MemoryUsage {
            total_bytes: 8 * 1024,
            available_bytes: 4 * 1024,
        })
    }

    fn disk(&self) -> ProbeResult<DiskUsage> {
        Err(ProbeError::Unavailable { resource: "disk" })
    }
}

#[test]
fn test_agent_execution_scenario() {
    let (monitor, _clock) = create_test_monitor(MonitorConfig::default());
    let mut alerts = monitor.subscribe_alerts();

    monitor.record_agent_execution("demo", 45.0, true);

    let stats = monitor.get_stats(names::AGENT_EXECUTION_TIME).unwrap();
    assert_eq!(stats.current, 45.0);
    assert_eq!(stats.count, 1);
    assert_eq!(stats.trend, Trend::Stable);

    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.metric_name, names::AGENT_EXECUTION_TIME);
    assert_eq!(alert.level, AlertLevel::Warning);
    assert_eq!(alert.value, 45.0);
    assert!(alerts.try_recv().is_err());

    let per_agent = monitor.get_recent(&names::agent_execution("demo"), 5);
    assert_eq!(per_agent.len(), 1);
    assert_eq!(per_agent[0].metadata["agent"], "demo");
    assert_eq!(per_agent[0].metadata["success"], true);
}

#[test]
fn test_mixed_workload() {
    let (monitor, clock) = create_test_monitor(MonitorConfig::default());

    for i in 0..12 {
        monitor.record_llm_request("local", 1.0 + f64::from(i), Some(100));
        monitor.record_db_query("select", 0.01);
        clock.advance(ChronoDuration::seconds(1));
    }

    let metric_names = monitor.list_metric_names();
    assert!(metric_names.contains(names::LLM_RESPONSE_TIME));
    assert!(metric_names.contains("llm_tokens_local"));
    assert!(metric_names.contains("db_query_select"));

    let llm = monitor.get_stats(names::LLM_RESPONSE_TIME).unwrap();
    assert_eq!(llm.count, 12);
    assert_eq!(llm.minimum, 1.0);
    assert_eq!(llm.maximum, 12.0);
    assert_eq!(llm.trend, Trend::Increasing);

    let db = monitor.get_stats("db_query_select").unwrap();
    assert_eq!(db.trend, Trend::Stable);

    assert_eq!(monitor.all_stats().len(), 3);
}

#[test]
fn test_retention_window_with_small_capacity() {
    let mut config = MonitorConfig::default();
    config.storage.capacity = 5;
    config.storage.retention_hours = 1;
    let (monitor, clock) = create_test_monitor(config);

    for i in 0..8 {
        monitor.record_db_query("insert", f64::from(i));
        clock.advance(ChronoDuration::minutes(5));
    }

    let values: Vec<f64> = monitor
        .get_recent("db_query_insert", 60)
        .iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);

    clock.advance(ChronoDuration::hours(2));
    assert!(monitor.get_recent("db_query_insert", 60).is_empty());

    // retained until the next insertion prunes them
    monitor.record_db_query("insert", 100.0);
    assert_eq!(monitor.series_len("db_query_insert"), 1);
}

#[test]
fn test_custom_thresholds_from_config() {
    let mut config = MonitorConfig::default();
    config
        .alerts
        .thresholds
        .insert("db_query_select".to_string(), Threshold::new(0.5, 2.0));
    let (monitor, _clock) = create_test_monitor(config);
    let mut alerts = monitor.subscribe_alerts();

    monitor.record_db_query("select", 3.0);
    assert_eq!(alerts.try_recv().unwrap().level, AlertLevel::Critical);

    monitor.remove_threshold("db_query_select");
    monitor.record_db_query("select", 3.0);
    assert!(alerts.try_recv().is_err());

    // defaults are still present
    assert!(monitor.threshold(names::CPU_USAGE).is_some());
}

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("monitor.toml");

    let mut config = MonitorConfig::default();
    config.sampling.interval_secs = 2;
    config.storage.capacity = 50;
    config
        .alerts
        .thresholds
        .insert("ui_response_time".to_string(), Threshold::new(0.2, 1.0));
    config.save_to_file(&path).unwrap();

    let loaded = MonitorConfig::from_file(&path).unwrap();
    assert_eq!(loaded.sampling.interval_secs, 2);
    assert_eq!(loaded.storage.capacity, 50);
    assert_eq!(
        loaded.alerts.thresholds.get("ui_response_time"),
        Some(&Threshold::new(0.2, 1.0))
    );

    let (monitor, _clock) = create_test_monitor(loaded);
    assert_eq!(monitor.capacity(), 50);
    assert_eq!(
        monitor.threshold("ui_response_time"),
        Some(Threshold::new(0.2, 1.0))
    );
}

#[test]
fn test_invalid_config_file_fails_construction() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("monitor.toml");
    std::fs::write(&path, "[storage]\ncapacity = 0\n").unwrap();

    let err = MonitorConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "storage.capacity"));

    let mut config = MonitorConfig::default();
    config.storage.retention_hours = 0;
    assert!(PerformanceMonitor::new(&config).is_err());
    assert!(MonitorService::new(config).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_service_samples_until_shutdown() {
    let mut config = MonitorConfig::default();
    config.sampling.interval_secs = 5;
    let service =
        MonitorService::with_parts(config, Arc::new(StaticProbe), Arc::new(ManualClock::default()))
            .unwrap();
    let monitor = service.monitor();
    let mut alerts = monitor.subscribe_alerts();

    service.start().unwrap();
    service.start().unwrap();
    tokio::time::sleep(Duration::from_millis(7_500)).await;

    assert_eq!(monitor.series_len(names::CPU_USAGE), 2);
    assert_eq!(monitor.series_len(names::MEMORY_USAGE), 2);
    assert_eq!(monitor.series_len(names::DISK_USAGE), 0);
    assert_eq!(monitor.get_stats(names::MEMORY_USAGE).unwrap().current, 50.0);

    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.metric_name, names::CPU_USAGE);
    assert_eq!(alert.level, AlertLevel::Critical);

    service.shutdown().await;
    assert!(!service.is_running());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(monitor.series_len(names::CPU_USAGE), 2);
}

#[tokio::test]
async fn test_stats_notifications_reach_subscribers() {
    let (monitor, _clock) = create_test_monitor(MonitorConfig::default());
    let monitor = Arc::new(monitor);
    let mut updates = monitor.subscribe_stats();
    let mut readings = monitor.subscribe_readings();

    let producer = monitor.clone();
    tokio::spawn(async move {
        producer.record_db_query("update", 0.25);
        producer.get_stats("db_query_update");
    })
    .await
    .unwrap();

    let reading = readings.recv().await.unwrap();
    assert_eq!(reading.name, "db_query_update");
    assert_eq!(reading.unit.as_deref(), Some("seconds"));

    let update = updates.recv().await.unwrap();
    assert_eq!(update.metric_name, "db_query_update");
    assert_eq!(update.stats.current, 0.25);
}

#[test]
fn test_json_export_reflects_state() {
    let (monitor, _clock) = create_test_monitor(MonitorConfig::default());
    monitor.record_agent_execution("planner", 2.0, false);

    let json = monitor.export_metrics(ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["metrics"]["agent_execution_time"]["current"], 2.0);
    assert_eq!(value["metrics"]["agent_execution_planner"]["count"], 1);
    assert_eq!(value["thresholds"]["cpu_usage"]["critical"], 95.0);

    monitor.clear(None);
    let json = monitor.export_metrics(ExportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["metrics"].as_object().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_producers() {
    let mut config = MonitorConfig::default();
    config.storage.capacity = 150;
    let (monitor, _clock) = create_test_monitor(config);
    let monitor = Arc::new(monitor);

    let handles: Vec<_> = (0..8)
        .map(|task| {
            let monitor = monitor.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    monitor.record_agent_execution(&format!("agent{}", task), f64::from(i), true);
                    if i % 10 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles).await;
    assert!(results.iter().all(|r| r.is_ok()));

    // shared series is capacity bound, per-agent series hold everything
    assert_eq!(monitor.series_len(names::AGENT_EXECUTION_TIME), 150);
    for task in 0..8 {
        assert_eq!(monitor.series_len(&names::agent_execution(&format!("agent{}", task))), 50);
    }
    assert_eq!(monitor.list_metric_names().len(), 9);
}
