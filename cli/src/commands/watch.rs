use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use pulse_monitor::{Alert, MonitorConfig, MonitorService};
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long, short)]
    pub duration: Option<u64>,

    /// Override the sampling interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
}

pub async fn run(args: WatchArgs, mut config: MonitorConfig, output: OutputManager) -> Result<()> {
    if let Some(interval) = args.interval {
        config.sampling.interval_secs = interval;
    }
    config.sampling.enabled = true;

    let service = MonitorService::new(config)?;
    let monitor = service.monitor();
    let mut alerts = monitor.subscribe_alerts();

    service.start()?;
    output.print_info(&format!(
        "Sampling every {}s, press Ctrl-C to stop",
        service.config().sampling.interval_secs
    ));

    let deadline = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };

    let outcome = stream_alerts(&mut alerts, tokio::signal::ctrl_c(), deadline, &output).await;

    service.shutdown().await;
    output.print_stats(&monitor.all_stats())?;

    // Ctrl-C is the normal way to end an open-ended watch
    match outcome {
        Err(CliError::Cancelled) if args.duration.is_none() => Ok(()),
        other => other,
    }
}

/// Print alerts until `shutdown` or `deadline` completes
///
/// Both futures live for the whole loop, so an interrupt that arrives while
/// an alert is being printed is still observed on the next turn.
async fn stream_alerts<S, D>(
    alerts: &mut broadcast::Receiver<Alert>,
    shutdown: S,
    deadline: D,
    output: &OutputManager,
) -> Result<()>
where
    S: Future,
    D: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, stopping sampler");
                return Err(CliError::Cancelled);
            }
            _ = &mut deadline => return Ok(()),
            alert = alerts.recv() => match alert {
                Ok(alert) => output.print_alert(&alert)?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Alert subscriber lagged");
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}
