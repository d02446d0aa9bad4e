use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{info, Level};
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod error;
mod output;

use commands::*;
use error::{CliError, Result};
use output::{OutputFormat, OutputManager};
use pulse_monitor::MonitorConfig;

#[derive(Parser)]
#[command(name = "pulsectl")]
#[command(about = "Pulse CLI - Performance monitoring for the desktop assistant")]
#[command(version)]
#[command(long_about = "
Pulse CLI (pulsectl) records, samples and summarises performance metrics for the
desktop assistant and raises threshold alerts.

Examples:
  pulsectl watch --duration 60                 # Sample host resources for a minute
  pulsectl sample --ticks 5                    # Take five samples and print stats
  pulsectl demo                                # Run a sample agent/LLM/database workload
  pulsectl export --format prometheus          # Print Prometheus text exposition
  pulsectl config init                         # Write a default configuration file
")]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "PULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// Output format for summaries
    #[arg(long, global = true, value_enum, default_value = "table")]
    output_format: OutputFormatArg,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormatArg {
    Table,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sample host resources continuously and print alerts
    Watch(WatchArgs),

    /// Take a fixed number of resource samples
    Sample(SampleArgs),

    /// Record a demonstration workload and print the results
    Demo(DemoArgs),

    /// Export metric statistics
    Export(ExportArgs),

    /// Manage Pulse configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = load_config(&cli);

    if let Err(e) = initialize_logging(&cli, loaded.as_ref().ok()) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_command(cli, loaded).await {
        let error_msg = error::format_error(&e);
        eprintln!("{}", error_msg);
        process::exit(e.exit_code());
    }
}

async fn run_command(cli: Cli, loaded: Result<MonitorConfig>) -> Result<()> {
    let colored = !cli.no_color && console::Term::stdout().features().colors_supported();
    let output = OutputManager::new(OutputFormat::from(cli.output_format), colored);

    match cli.command {
        Commands::Config(args) => commands::config::run(args, loaded, output).await,
        Commands::Watch(args) => commands::watch::run(args, loaded?, output).await,
        Commands::Sample(args) => commands::sample::run(args, loaded?, output).await,
        Commands::Demo(args) => commands::demo::run(args, loaded?, output).await,
        Commands::Export(args) => commands::export::run(args, loaded?, output).await,
    }
}

/// Initialize logging based on CLI flags and the loaded configuration
fn initialize_logging(cli: &Cli, config: Option<&MonitorConfig>) -> Result<()> {
    let level_name = cli
        .log_level
        .clone()
        .or_else(|| config.map(|c| c.logging.level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    let log_level = parse_level(&level_name);
    let json = cli.json_logs || config.is_some_and(|c| c.logging.json);

    let filter = EnvFilter::from_default_env()
        .add_directive(directive(&format!("pulse_monitor={}", log_level))?)
        .add_directive(directive(&format!("pulsectl={}", log_level))?)
        .add_directive(directive("tokio=warn")?)
        .add_directive(directive("mio=warn")?);

    // Logs go to stderr so exported data on stdout stays clean
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| CliError::Logging(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| CliError::Logging(e.to_string()))?;
    }

    info!("Pulse CLI started");
    Ok(())
}

fn directive(value: &str) -> Result<Directive> {
    value.parse()
        .map_err(|e: ParseError| CliError::Logging(e.to_string()))
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Load configuration from file, environment or defaults
fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    match &cli.config {
        Some(path) => {
            let mut config = MonitorConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            config.validate()?;
            Ok(config)
        }
        None => {
            let default_path = MonitorConfig::default_config_path().ok();
            Ok(MonitorConfig::load_with_fallback(default_path)?)
        }
    }
}
