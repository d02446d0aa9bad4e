use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use pulse_monitor::{ExportFormat, MonitorConfig, PerformanceMonitor, Sampler, SysinfoProbe};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format (json, prometheus)
    #[arg(long, short, default_value = "json")]
    pub format: String,

    /// Output file path (stdout when omitted)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Host resource samples to take before exporting
    #[arg(long, default_value = "1")]
    pub ticks: u32,
}

pub async fn run(args: ExportArgs, config: MonitorConfig, output: OutputManager) -> Result<()> {
    let format: ExportFormat = args.format.parse()?;

    let monitor = Arc::new(PerformanceMonitor::new(&config)?);
    let probe = Arc::new(SysinfoProbe::new(config.sampling.disk_mount_point.clone()));
    let sampler = Sampler::new(monitor.clone(), probe, config.sampling_interval());
    tokio::task::block_in_place(|| {
        for _ in 0..args.ticks {
            sampler.tick();
        }
    });

    let rendered = monitor.export_metrics(format)?;
    info!("Exporting metrics (format: {}, output: {:?})", args.format, args.output);

    match args.output {
        Some(path) => {
            std::fs::write(&path, rendered).map_err(CliError::Io)?;
            output.print_success(&format!("Metrics exported to: {}", path.display()));
        }
        None => {
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}
