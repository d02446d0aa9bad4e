//! Top-level composition of the monitor and its sampler
//!
//! The application builds one [`MonitorService`] at startup and hands the
//! shared [`PerformanceMonitor`] to producers and dashboard consumers.

use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::monitor::PerformanceMonitor;
use crate::sampler::{ResourceProbe, Sampler, SysinfoProbe};

/// Owns the monitor and the resource sampler lifecycle
pub struct MonitorService {
    config: MonitorConfig,
    monitor: Arc<PerformanceMonitor>,
    sampler: Option<Sampler>,
}

impl MonitorService {
    /// Build the service with the host `sysinfo` probe and wall-clock time
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        let probe = Arc::new(SysinfoProbe::new(config.sampling.disk_mount_point.clone()));
        Self::with_parts(config, probe, Arc::new(SystemClock))
    }

    /// Build the service from explicit collaborators
    pub fn with_parts(
        config: MonitorConfig,
        probe: Arc<dyn ResourceProbe>,
        clock: Arc<dyn Clock>,
    ) -> MonitorResult<Self> {
        let monitor = Arc::new(PerformanceMonitor::with_clock(&config, clock)?);

        let sampler = config
            .sampling
            .enabled
            .then(|| Sampler::new(monitor.clone(), probe, config.sampling_interval()));

        Ok(Self {
            config,
            monitor,
            sampler,
        })
    }

    /// Shared handle for producers and consumers
    pub fn monitor(&self) -> Arc<PerformanceMonitor> {
        self.monitor.clone()
    }

    pub fn sampler(&self) -> Option<&Sampler> {
        self.sampler.as_ref()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start background sampling if enabled
    pub fn start(&self) -> MonitorResult<()> {
        match &self.sampler {
            Some(sampler) => sampler.start(),
            None => {
                info!("Resource sampling disabled");
                Ok(())
            }
        }
    }

    pub fn stop(&self) {
        if let Some(sampler) = &self.sampler {
            sampler.stop();
        }
    }

    /// Stop sampling and wait for the background task to finish
    pub async fn shutdown(&self) {
        if let Some(sampler) = &self.sampler {
            sampler.shutdown().await;
        }
        info!("Monitor service shut down");
    }

    pub fn is_running(&self) -> bool {
        self.sampler.as_ref().is_some_and(|s| s.is_running())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{ProbeError, ProbeResult};
    use crate::sampler::{DiskUsage, MemoryUsage};

    struct UnavailableProbe;

    impl ResourceProbe for UnavailableProbe {
        fn cpu_percent(&self) -> ProbeResult<f64> {
            Err(ProbeError::Unavailable { resource: "cpu" })
        }

        fn memory(&self) -> ProbeResult<MemoryUsage> {
            Err(ProbeError::Unavailable { resource: "memory" })
        }

        fn disk(&self) -> ProbeResult<DiskUsage> {
            Err(ProbeError::Unavailable { resource: "disk" })
        }
    }

    fn service(enabled: bool) -> MonitorService {
        let mut config = MonitorConfig::default();
        config.sampling.enabled = enabled;
        MonitorService::with_parts(config, Arc::new(UnavailableProbe), Arc::new(ManualClock::default()))
            .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MonitorConfig::default();
        config.storage.capacity = 0;
        assert!(MonitorService::new(config).is_err());
    }

    #[test]
    fn test_disabled_sampling() {
        let service = service(false);
        assert!(service.sampler().is_none());
        assert!(service.start().is_ok());
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_lifecycle_with_failing_probe() {
        let service = service(true);
        service.start().unwrap();
        assert!(service.is_running());

        tokio::task::yield_now().await;
        assert!(service.monitor().list_metric_names().is_empty());

        service.shutdown().await;
        assert!(!service.is_running());
    }

    #[test]
    fn test_shared_monitor_handle() {
        let service = service(false);
        let producer = service.monitor();
        producer.record_db_query("select", 0.1);
        assert!(service.monitor().get_stats("db_query_select").is_some());
    }
}
