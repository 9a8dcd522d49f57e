//! Client for the cluster state endpoint
//!
//! Fetches `_cluster/state` restricted to the sections the aggregator reads
//! and decodes it into a [`ClusterStateSnapshot`].

use index_health_core::ClusterStateSnapshot;
use std::time::Duration;

use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};

/// Path of the cluster state request, relative to the cluster URI
pub const CLUSTER_STATE_PATH: &str = "_cluster/state/metadata,blocks,routing_table";

/// Cluster state client
#[derive(Clone)]
pub struct ClusterStateClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl ClusterStateClient {
    /// Create new client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ExporterError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
        })
    }

    /// Create a client from exporter configuration
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        Ok(Self::new(config.es_uri.as_str())?.with_timeout(config.timeout()))
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state_url(&self) -> String {
        format!("{}/{}", self.base_url, CLUSTER_STATE_PATH)
    }

    /// Fetch and decode the cluster state.
    ///
    /// Connection errors, timeouts and non-success statuses are transport
    /// failures; an unreadable or malformed body is a decode failure, and so
    /// is a timeout that fires after the headers have arrived.
    pub async fn fetch_state(&self) -> Result<ClusterStateSnapshot> {
        let url = self.state_url();

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                ExporterError::Transport(format!("failed to get cluster state from {}: {}", url, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ExporterError::Decode(format!("failed to read response body: {}", e)))?;

        Ok(ClusterStateSnapshot::from_slice(&body)?)
    }
}
