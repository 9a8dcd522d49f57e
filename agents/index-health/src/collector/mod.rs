//! Index health collector
//!
//! One scrape runs one stateless poll: fetch → decode → aggregate → emit.
//! A failed fetch or decode sets `up` to 0 and emits no index series for
//! that scrape; only the process-scoped series are exported.

use index_health_core::{emit_records, HealthMap, IndexHealthAggregator};
use prometheus::proto::MetricFamily;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::client::ClusterStateClient;
use crate::config::ExporterConfig;
use crate::error::Result;
use crate::telemetry::IndexHealthMetricsRegistry;

/// Metric families gathered by one scrape
#[derive(Debug)]
pub struct Scrape {
    /// Per-index series followed by process-scoped series
    pub families: Vec<MetricFamily>,
    /// Number of per-index observations emitted
    pub records_emitted: usize,
    /// Whether the cluster state poll succeeded
    pub succeeded: bool,
}

/// Polls cluster state and turns it into index health metrics
pub struct IndexHealthCollector {
    client: ClusterStateClient,
    aggregator: IndexHealthAggregator,
    metrics: Arc<IndexHealthMetricsRegistry>,
}

impl IndexHealthCollector {
    pub fn new(
        client: ClusterStateClient,
        aggregator: IndexHealthAggregator,
        metrics: Arc<IndexHealthMetricsRegistry>,
    ) -> Self {
        Self {
            client,
            aggregator,
            metrics,
        }
    }

    /// Create a collector with its own metrics registry
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        let client = ClusterStateClient::from_config(config)?;
        let aggregator = IndexHealthAggregator::new(config.block_matching);
        let metrics = Arc::new(IndexHealthMetricsRegistry::new(config.namespace.as_str())?);
        Ok(Self::new(client, aggregator, metrics))
    }

    pub fn metrics(&self) -> &IndexHealthMetricsRegistry {
        &self.metrics
    }

    /// Run one poll and return the health mapping.
    ///
    /// Updates `total_scrapes`, `up` and, for decode failures only,
    /// `json_parse_failures`.
    pub async fn poll(&self) -> Result<HealthMap> {
        let poll_id = Uuid::new_v4();
        let start = Instant::now();
        let scrape = self.metrics.scrape();
        scrape.record_scrape();

        match self.client.fetch_state().await {
            Ok(snapshot) => {
                scrape.set_up(true);
                let records = self.aggregator.aggregate(&snapshot);
                tracing::debug!(
                    poll_id = %poll_id,
                    cluster = %snapshot.cluster_name,
                    indices = records.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Polled cluster state"
                );
                Ok(records)
            }
            Err(e) => {
                scrape.set_up(false);
                if e.is_decode_failure() {
                    scrape.record_parse_failure();
                }
                tracing::warn!(
                    poll_id = %poll_id,
                    error = %e,
                    "Failed to fetch and decode cluster state"
                );
                Err(e)
            }
        }
    }

    /// Run one poll and gather every metric family for exposition
    pub async fn collect(&self) -> Result<Scrape> {
        let (mut families, records_emitted, succeeded) = match self.poll().await {
            Ok(records) => {
                let mut sink = self.metrics.status_sink()?;
                let emitted = emit_records(&records, &mut sink)?;
                (sink.into_families(), emitted, true)
            }
            Err(_) => (Vec::new(), 0, false),
        };

        families.extend(self.metrics.gather());

        Ok(Scrape {
            families,
            records_emitted,
            succeeded,
        })
    }

    /// Run one poll and render the Prometheus text exposition
    pub async fn render(&self) -> Result<String> {
        let scrape = self.collect().await?;
        self.metrics.encode_text(scrape.families)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_collector() -> IndexHealthCollector {
        let config = ExporterConfig::builder()
            .es_uri("http://127.0.0.1:1")
            .timeout_ms(200)
            .build();
        IndexHealthCollector::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_transport_failure_bookkeeping() {
        let collector = unreachable_collector();

        let scrape = collector.collect().await.unwrap();
        assert!(!scrape.succeeded);
        assert_eq!(scrape.records_emitted, 0);

        let metrics = collector.metrics().scrape();
        assert_eq!(metrics.up(), 0);
        assert_eq!(metrics.total_scrapes(), 1);
        assert_eq!(metrics.json_parse_failures(), 0);
    }

    #[tokio::test]
    async fn test_failed_render_exports_only_scrape_series() {
        let collector = unreachable_collector();
        let text = tokio::time::timeout(Duration::from_secs(5), collector.render())
            .await
            .unwrap()
            .unwrap();

        assert!(text.contains("elasticsearch_index_health_up 0"));
        assert!(text.contains("elasticsearch_index_health_total_scrapes 1"));
        assert!(!text.contains("elasticsearch_index_health_status"));
    }
}
