//! Error types for the Index Health Exporter
//!
//! Separates transport failures from decode failures so the collector can
//! bump the right counter.

use index_health_core::SnapshotError;
use thiserror::Error;

/// Main error type for exporter operations
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Network failure or timeout while fetching cluster state
    #[error("Transport error: {0}")]
    Transport(String),

    /// Cluster answered with a non-success status
    #[error("HTTP request failed with code {status}")]
    HttpStatus { status: u16 },

    /// Response body could not be read or decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registration or encoding failure
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// File access error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ExporterError::Config(msg.into())
    }

    /// Whether this failure counts as a decode failure
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, ExporterError::Decode(_))
    }

    /// Whether this failure happened while talking to the cluster
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ExporterError::Transport(_) | ExporterError::HttpStatus { .. }
        )
    }
}

impl From<SnapshotError> for ExporterError {
    fn from(err: SnapshotError) -> Self {
        ExporterError::Decode(err.to_string())
    }
}

impl From<serde_yaml::Error> for ExporterError {
    fn from(err: serde_yaml::Error) -> Self {
        ExporterError::Config(format!("YAML error: {}", err))
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Config(format!("JSON error: {}", err))
    }
}

/// Result type alias for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;
