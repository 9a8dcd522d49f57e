//! Exporter configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional YAML or
//! JSON file, then CLI flags. Every flag falls back to an environment
//! variable, resolved by the binary's argument parser.

use index_health_core::BlockMatching;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ExporterError, Result};

pub const DEFAULT_ES_URI: &str = "http://localhost:9200";
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9114";
pub const DEFAULT_NAMESPACE: &str = "elasticsearch";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Exporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Base URI of the cluster
    pub es_uri: String,

    /// Timeout for a single cluster state fetch, in milliseconds
    pub timeout_ms: u64,

    /// Address the metrics endpoint binds to
    pub listen_address: String,

    /// Metric namespace, the `<namespace>` in `<namespace>_index_health_<metric>`
    pub namespace: String,

    /// How block level tokens map to access flags
    pub block_matching: BlockMatching,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            es_uri: DEFAULT_ES_URI.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            block_matching: BlockMatching::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ExporterConfig {
    /// Create a new config builder
    pub fn builder() -> ExporterConfigBuilder {
        ExporterConfigBuilder::new()
    }

    /// Load config from a YAML (`.yaml`/`.yml`) or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: ExporterConfig = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check the configuration before use
    pub fn validate(&self) -> Result<()> {
        let uri = reqwest::Url::parse(&self.es_uri)
            .map_err(|e| ExporterError::config(format!("invalid es_uri '{}': {}", self.es_uri, e)))?;
        if !matches!(uri.scheme(), "http" | "https") {
            return Err(ExporterError::config(format!(
                "es_uri must use http or https, got '{}'",
                uri.scheme()
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ExporterError::config("timeout_ms must be greater than zero"));
        }
        if self.namespace.is_empty() {
            return Err(ExporterError::config("namespace must not be empty"));
        }
        Ok(())
    }
}

/// Builder for ExporterConfig
pub struct ExporterConfigBuilder {
    config: ExporterConfig,
}

impl ExporterConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: ExporterConfig::default(),
        }
    }

    /// Set the cluster URI
    pub fn es_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.es_uri = uri.into();
        self
    }

    /// Set the fetch timeout in milliseconds
    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.config.timeout_ms = timeout;
        self
    }

    /// Set the listen address
    pub fn listen_address(mut self, address: impl Into<String>) -> Self {
        self.config.listen_address = address.into();
        self
    }

    /// Set the metric namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set the block matching mode
    pub fn block_matching(mut self, matching: BlockMatching) -> Self {
        self.config.block_matching = matching;
        self
    }

    /// Set the log format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExporterConfig {
        self.config
    }
}

impl Default for ExporterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
