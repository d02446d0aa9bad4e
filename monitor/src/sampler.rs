//! Periodic host resource sampler
//!
//! Polls CPU, memory and disk utilisation on a fixed interval and records
//! them like any other producer. Each resource is read independently: one
//! failing probe is logged and skipped while the others are still recorded
//! and the timer keeps running.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, MonitorResult, ProbeError, ProbeResult};
use crate::monitor::PerformanceMonitor;
use crate::recorder::names;
use crate::types::{Metadata, MetricType};

/// Virtual memory snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryUsage {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let used = self.total_bytes.saturating_sub(self.available_bytes);
        used as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Volume usage snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl DiskUsage {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Source of host resource readings
pub trait ResourceProbe: Send + Sync {
    /// Global CPU utilisation in percent
    fn cpu_percent(&self) -> ProbeResult<f64>;

    fn memory(&self) -> ProbeResult<MemoryUsage>;

    fn disk(&self) -> ProbeResult<DiskUsage>;
}

struct SystemHandle {
    system: System,
    last_cpu_refresh: Instant,
}

/// [`ResourceProbe`] backed by `sysinfo`
///
/// CPU usage is a delta between two refreshes at least
/// `MINIMUM_CPU_UPDATE_INTERVAL` apart, so the `System` handle is kept across
/// ticks and a read that comes too soon blocks until the interval has passed.
pub struct SysinfoProbe {
    handle: Mutex<SystemHandle>,
    disk_mount_point: Option<PathBuf>,
}

impl SysinfoProbe {
    pub fn new(disk_mount_point: Option<PathBuf>) -> Self {
        let mut system = System::new();
        system.refresh_cpu();

        Self {
            handle: Mutex::new(SystemHandle {
                system,
                last_cpu_refresh: Instant::now(),
            }),
            disk_mount_point,
        }
    }

    fn lock(&self, resource: &'static str) -> ProbeResult<std::sync::MutexGuard<'_, SystemHandle>> {
        self.handle.lock().map_err(|_| ProbeError::ReadFailed {
            resource,
            reason: "system handle poisoned".to_string(),
        })
    }
}

/// Time still to wait before a CPU refresh yields a meaningful delta
fn cpu_settle_delay(since_last_refresh: Duration, minimum: Duration) -> Duration {
    minimum.saturating_sub(since_last_refresh)
}

impl ResourceProbe for SysinfoProbe {
    fn cpu_percent(&self) -> ProbeResult<f64> {
        let mut handle = self.lock("cpu")?;

        let wait = cpu_settle_delay(handle.last_cpu_refresh.elapsed(), MINIMUM_CPU_UPDATE_INTERVAL);
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "Waiting for CPU usage to settle");
            std::thread::sleep(wait);
        }

        handle.system.refresh_cpu();
        handle.last_cpu_refresh = Instant::now();

        if handle.system.cpus().is_empty() {
            return Err(ProbeError::Unavailable { resource: "cpu" });
        }

        Ok(f64::from(handle.system.global_cpu_info().cpu_usage()))
    }

    fn memory(&self) -> ProbeResult<MemoryUsage> {
        let mut handle = self.lock("memory")?;
        let system = &mut handle.system;
        system.refresh_memory();

        let total_bytes = system.total_memory();
        if total_bytes == 0 {
            return Err(ProbeError::Unavailable { resource: "memory" });
        }

        Ok(MemoryUsage {
            total_bytes,
            available_bytes: system.available_memory(),
        })
    }

    fn disk(&self) -> ProbeResult<DiskUsage> {
        let disks = Disks::new_with_refreshed_list();
        let disk = select_disk(
            disks.list().iter().map(|d| (d.mount_point(), d.total_space())),
            self.disk_mount_point.as_deref(),
        )
        .and_then(|mount| disks.list().iter().find(|d| d.mount_point() == mount))
        .ok_or(ProbeError::Unavailable { resource: "disk" })?;

        let total_bytes = disk.total_space();
        if total_bytes == 0 {
            return Err(ProbeError::ReadFailed {
                resource: "disk",
                reason: format!("{} reports zero capacity", disk.mount_point().display()),
            });
        }

        Ok(DiskUsage {
            mount_point: disk.mount_point().to_path_buf(),
            total_bytes,
            used_bytes: total_bytes.saturating_sub(disk.available_space()),
        })
    }
}

/// Pick the primary volume: the configured mount point, else `/`, else the largest
fn select_disk<'a, I>(disks: I, preferred: Option<&Path>) -> Option<&'a Path>
where
    I: Iterator<Item = (&'a Path, u64)> + Clone,
{
    if let Some(preferred) = preferred {
        return disks.clone().map(|(mount, _)| mount).find(|mount| *mount == preferred);
    }

    disks
        .clone()
        .map(|(mount, _)| mount)
        .find(|mount| *mount == Path::new("/"))
        .or_else(|| disks.max_by_key(|(_, total)| *total).map(|(mount, _)| mount))
}

/// Outcome of one sampler tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub recorded: usize,
    pub failed: usize,
}

struct SamplerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic producer of system resource metrics
pub struct Sampler {
    monitor: Arc<PerformanceMonitor>,
    probe: Arc<dyn ResourceProbe>,
    interval: Duration,
    task: Mutex<Option<SamplerTask>>,
}

impl Sampler {
    pub fn new(
        monitor: Arc<PerformanceMonitor>,
        probe: Arc<dyn ResourceProbe>,
        interval: Duration,
    ) -> Self {
        Self {
            monitor,
            probe,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Sample every resource once on the calling thread
    ///
    /// Probe reads block, so async callers should go through
    /// `spawn_blocking` or `block_in_place`.
    pub fn tick(&self) -> TickReport {
        sample_resources(&self.monitor, self.probe.as_ref())
    }

    /// Start ticking on the current tokio runtime; a no-op when already active
    pub fn start(&self) -> MonitorResult<()> {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());

        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            debug!("Sampler already running");
            return Ok(());
        }

        if self.interval.is_zero() {
            return Err(MonitorError::Generic("sampler interval must be non-zero".to_string()));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MonitorError::Runtime(format!("sampler needs a tokio runtime: {}", e)))?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let monitor = self.monitor.clone();
        let probe = self.probe.clone();
        let period = self.interval;

        let handle = runtime.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // probe reads touch procfs and statvfs and may stall
                        let monitor = monitor.clone();
                        let probe = probe.clone();
                        let tick = tokio::task::spawn_blocking(move || {
                            sample_resources(&monitor, probe.as_ref())
                        });
                        if let Err(e) = tick.await {
                            warn!("Sampler tick failed: {}", e);
                        }
                    }
                }
            }

            debug!("Sampler task exited");
        });

        info!(interval_secs = period.as_secs_f64(), "Started resource sampler");
        *task = Some(SamplerTask { cancel, handle });
        Ok(())
    }

    /// Cancel the next tick; an in-flight tick finishes. No-op when inactive.
    pub fn stop(&self) {
        if let Some(task) = self.take_task() {
            task.cancel.cancel();
            info!("Stopped resource sampler");
        }
    }

    /// Stop and wait for the background task to exit
    pub async fn shutdown(&self) {
        if let Some(task) = self.take_task() {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                warn!("Sampler task ended abnormally: {}", e);
            }
            info!("Resource sampler shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn take_task(&self) -> Option<SamplerTask> {
        self.task.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if let Some(task) = self.take_task() {
            task.cancel.cancel();
        }
    }
}

fn sample_resources(monitor: &PerformanceMonitor, probe: &dyn ResourceProbe) -> TickReport {
    let mut report = TickReport::default();

    match probe.cpu_percent() {
        Ok(percent) => {
            monitor.record(MetricType::CpuUsage, names::CPU_USAGE, percent, Some("%"), None);
            report.recorded += 1;
        }
        Err(e) => {
            warn!("Failed to sample CPU usage: {}", e);
            report.failed += 1;
        }
    }

    match probe.memory() {
        Ok(memory) => {
            let mut metadata = Metadata::new();
            metadata.insert("available_bytes".to_string(), json!(memory.available_bytes));
            metadata.insert("total_bytes".to_string(), json!(memory.total_bytes));

            monitor.record(
                MetricType::MemoryUsage,
                names::MEMORY_USAGE,
                memory.percent(),
                Some("%"),
                Some(metadata),
            );
            report.recorded += 1;
        }
        Err(e) => {
            warn!("Failed to sample memory usage: {}", e);
            report.failed += 1;
        }
    }

    match probe.disk() {
        Ok(disk) => {
            let mut metadata = Metadata::new();
            metadata.insert("used_bytes".to_string(), json!(disk.used_bytes));
            metadata.insert("total_bytes".to_string(), json!(disk.total_bytes));
            metadata.insert(
                "mount_point".to_string(),
                json!(disk.mount_point.to_string_lossy()),
            );

            monitor.record(
                MetricType::SystemResource,
                names::DISK_USAGE,
                disk.percent(),
                Some("%"),
                Some(metadata),
            );
            report.recorded += 1;
        }
        Err(e) => {
            warn!("Failed to sample disk usage: {}", e);
            report.failed += 1;
        }
    }

    debug!(recorded = report.recorded, failed = report.failed, "Sampler tick");
    report
}
