use pulse_monitor::error::{ConfigError, ExportError};
use pulse_monitor::MonitorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("File already exists: {path}")]
    FileExists { path: String },

    #[error("Operation cancelled by user")]
    Cancelled,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 1,
            CliError::Io(_) => 2,
            CliError::Monitor(MonitorError::Runtime(_)) => 3,
            CliError::Monitor(MonitorError::Config(_)) => 1,
            CliError::Export(_) => 4,
            CliError::FileExists { .. } => 5,
            CliError::Cancelled => 130, // Standard Unix signal for SIGINT
            _ => 1,                     // Generic error
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Format error for user-friendly display
pub fn format_error(error: &CliError) -> String {
    match error {
        CliError::Config(e) | CliError::Monitor(MonitorError::Config(e)) => {
            format!("Configuration Error: {}\n\nTry running 'pulsectl config validate' to check your configuration.", e)
        }
        CliError::Export(ExportError::UnsupportedFormat { format }) => {
            format!("Unsupported export format: {}\n\nSupported formats: json, prometheus.", format)
        }
        CliError::FileExists { path } => {
            format!("File Already Exists: {}\n\nPass --force to overwrite it.", path)
        }
        CliError::Cancelled => "Operation cancelled by user.".to_string(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let config = CliError::Config(ConfigError::ParseError { reason: "bad".to_string() });
        assert_eq!(config.exit_code(), 1);

        let runtime = CliError::Monitor(MonitorError::Runtime("no runtime".to_string()));
        assert_eq!(runtime.exit_code(), 3);

        assert_eq!(CliError::Cancelled.exit_code(), 130);
        assert_eq!(
            CliError::FileExists { path: "/tmp/x".to_string() }.exit_code(),
            5
        );
    }

    #[test]
    fn test_format_error_hints() {
        let nested = CliError::Monitor(MonitorError::Config(ConfigError::InvalidValue {
            field: "storage.capacity".to_string(),
            value: "0".to_string(),
        }));
        let message = format_error(&nested);
        assert!(message.contains("storage.capacity"));
        assert!(message.contains("pulsectl config validate"));

        let export = CliError::Export(ExportError::UnsupportedFormat { format: "xml".to_string() });
        assert!(format_error(&export).contains("json, prometheus"));
    }
}
