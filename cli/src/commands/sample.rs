use crate::error::Result;
use crate::output::OutputManager;
use clap::Args;
use pulse_monitor::{MonitorConfig, PerformanceMonitor, Sampler, SysinfoProbe};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Number of sampler ticks to run
    #[arg(long, short = 'n', default_value = "3")]
    pub ticks: u32,

    /// Delay between ticks in milliseconds
    #[arg(long, default_value = "500")]
    pub delay_ms: u64,
}

pub async fn run(args: SampleArgs, config: MonitorConfig, output: OutputManager) -> Result<()> {
    let monitor = Arc::new(PerformanceMonitor::new(&config)?);
    let probe = Arc::new(SysinfoProbe::new(config.sampling.disk_mount_point.clone()));
    let sampler = Sampler::new(monitor.clone(), probe, config.sampling_interval());

    let pb = output.create_progress_bar(u64::from(args.ticks), "Sampling host resources")?;
    let mut failed = 0;

    for tick in 0..args.ticks {
        if tick > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }
        let report = tokio::task::block_in_place(|| sampler.tick());
        debug!(tick, recorded = report.recorded, failed = report.failed, "Sample tick");
        failed += report.failed;
        pb.inc(1);
    }
    pb.finish_and_clear();

    if failed > 0 {
        output.print_warning(&format!("{} resource reading(s) failed, see logs", failed));
    }

    output.print_stats(&monitor.all_stats())
}
