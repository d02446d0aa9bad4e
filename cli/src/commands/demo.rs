use crate::error::Result;
use crate::output::{OutputFormat, OutputManager};
use clap::Args;
use pulse_monitor::{Alert, MonitorConfig, PerformanceMonitor, PerformanceStats};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Agent name used for the execution reading
    #[arg(long, default_value = "demo")]
    pub agent: String,

    /// Agent execution time in seconds
    #[arg(long, default_value = "45.0")]
    pub execution_secs: f64,
}

#[derive(Serialize)]
struct DemoReport {
    stats: BTreeMap<String, PerformanceStats>,
    alerts: Vec<Alert>,
}

/// Record a representative agent, LLM and database workload
pub async fn run(args: DemoArgs, config: MonitorConfig, output: OutputManager) -> Result<()> {
    let monitor = PerformanceMonitor::new(&config)?;
    let mut alerts = monitor.subscribe_alerts();

    monitor.record_agent_execution(&args.agent, args.execution_secs, true);
    monitor.record_llm_request("local-7b", 2.4, Some(512));
    monitor.record_llm_request("local-7b", 6.1, Some(1024));
    monitor.record_db_query("select", 0.012);
    monitor.record_db_query("insert", 0.048);

    let mut raised = Vec::new();
    while let Ok(alert) = alerts.try_recv() {
        raised.push(alert);
    }

    let stats = monitor.all_stats();

    match output.format() {
        OutputFormat::Json => output.print_json(&DemoReport {
            stats,
            alerts: raised,
        }),
        OutputFormat::Table => {
            output.print_stats(&stats)?;
            println!();
            output.print_alerts(&raised)
        }
    }
}
