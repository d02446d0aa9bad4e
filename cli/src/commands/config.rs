use crate::error::{CliError, Result};
use crate::output::OutputManager;
use clap::Args;
use pulse_monitor::MonitorConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration action
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Validate configuration
    Validate,

    /// Write a default configuration file
    Init {
        /// Destination path (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// `loaded` is the outcome of loading the effective configuration
pub async fn run(args: ConfigArgs, loaded: Result<MonitorConfig>, output: OutputManager) -> Result<()> {
    match args.action {
        ConfigAction::Show => output.print_config(&loaded?),
        ConfigAction::Validate => {
            let config = loaded?;
            config.validate()?;
            output.print_success("Configuration is valid");
            Ok(())
        }
        ConfigAction::Init { path, force } => init_config(&output, path, force),
    }
}

fn init_config(output: &OutputManager, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => MonitorConfig::default_config_path()?,
    };

    if path.exists() && !force {
        return Err(CliError::FileExists {
            path: path.display().to_string(),
        });
    }

    MonitorConfig::default().save_to_file(&path)?;
    info!("Wrote default configuration to {}", path.display());
    output.print_success(&format!("Configuration written to: {}", path.display()));
    Ok(())
}
