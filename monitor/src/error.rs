//! Error handling for the Pulse monitor
//!
//! Recording and querying never surface errors to callers. The types here
//! cover the checked surfaces: configuration loading and validation,
//! resource probes used by the sampler, snapshot export and runtime setup.

use std::io;

use thiserror::Error;

/// The main error type for the monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Host resource probe errors
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Snapshot export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Async runtime errors (e.g. starting the sampler outside a runtime)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration file permission denied: {path}")]
    PermissionDenied { path: String },
}

/// Host resource probe errors
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{resource} information unavailable")]
    Unavailable { resource: &'static str },

    #[error("Failed to read {resource}: {reason}")]
    ReadFailed { resource: &'static str, reason: String },
}

/// Snapshot export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Export encoding failed: {reason}")]
    EncodingFailed { reason: String },
}

/// Result type alias for convenience
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// A specialized result type for resource probes
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// A specialized result type for export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

impl MonitorError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            MonitorError::Probe(_) => true,
            MonitorError::Config(_) => false,
            MonitorError::Runtime(_) => false,
            MonitorError::Io(io_error) => {
                matches!(io_error.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
            }
            _ => true,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::Config(_) => "config",
            MonitorError::Probe(_) => "probe",
            MonitorError::Export(_) => "export",
            MonitorError::Io(_) => "io",
            MonitorError::Serialization(_) => "serialization",
            MonitorError::Runtime(_) => "runtime",
            MonitorError::Generic(_) => "generic",
        }
    }
}

impl From<String> for MonitorError {
    fn from(msg: String) -> Self {
        MonitorError::Generic(msg)
    }
}

impl From<&str> for MonitorError {
    fn from(msg: &str) -> Self {
        MonitorError::Generic(msg.to_string())
    }
}
