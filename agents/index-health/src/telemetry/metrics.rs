//! Prometheus metrics for the Index Health Exporter
//!
//! Series, all named `<namespace>_index_health_<metric>`:
//! - `status` (gauge) - per-index severity with 12 labels, rebuilt on every scrape
//! - `up` (gauge) - 1 when the last cluster state poll succeeded
//! - `total_scrapes` (counter) - polls attempted
//! - `json_parse_failures` (counter) - polls that failed to decode
//!
//! # Example
//!
//! ```rust,no_run
//! use index_health::telemetry::IndexHealthMetricsRegistry;
//!
//! let registry = IndexHealthMetricsRegistry::new("elasticsearch").unwrap();
//! registry.scrape().record_scrape();
//! registry.scrape().set_up(true);
//!
//! let text = registry.encode_text(registry.gather()).unwrap();
//! ```

use index_health_core::{HealthSink, LABEL_NAMES};
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{ExporterError, Result};

/// Subsystem shared by every series of this exporter
pub const SUBSYSTEM: &str = "index_health";

/// Process-scoped scrape bookkeeping
///
/// Prometheus counters and gauges are atomic, so one instance is shared by
/// all concurrent scrapes.
pub struct ScrapeMetrics {
    up: IntGauge,
    total_scrapes: IntCounter,
    json_parse_failures: IntCounter,
}

impl ScrapeMetrics {
    /// Create the scrape series and register them with the provided registry
    pub fn new(namespace: &str, registry: &Registry) -> Result<Self> {
        let up = IntGauge::with_opts(
            Opts::new(
                "up",
                "Was the last scrape of the ElasticSearch index health endpoint successful.",
            )
            .namespace(namespace)
            .subsystem(SUBSYSTEM),
        )?;

        let total_scrapes = IntCounter::with_opts(
            Opts::new(
                "total_scrapes",
                "Current total ElasticSearch index health scrapes.",
            )
            .namespace(namespace)
            .subsystem(SUBSYSTEM),
        )?;

        let json_parse_failures = IntCounter::with_opts(
            Opts::new(
                "json_parse_failures",
                "Number of errors while parsing JSON.",
            )
            .namespace(namespace)
            .subsystem(SUBSYSTEM),
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(total_scrapes.clone()))?;
        registry.register(Box::new(json_parse_failures.clone()))?;

        Ok(Self {
            up,
            total_scrapes,
            json_parse_failures,
        })
    }

    /// Record the start of a scrape
    pub fn record_scrape(&self) {
        self.total_scrapes.inc();
    }

    /// Set the liveness gauge
    pub fn set_up(&self, up: bool) {
        self.up.set(i64::from(up));
    }

    /// Record a decode failure
    pub fn record_parse_failure(&self) {
        self.json_parse_failures.inc();
    }

    pub fn up(&self) -> i64 {
        self.up.get()
    }

    pub fn total_scrapes(&self) -> u64 {
        self.total_scrapes.get()
    }

    pub fn json_parse_failures(&self) -> u64 {
        self.json_parse_failures.get()
    }
}

/// Per-scrape sink for the `status` series.
///
/// Each scrape owns a fresh, unregistered gauge vector so indices that
/// disappeared from the cluster never linger and overlapping scrapes never
/// share series.
pub struct StatusSink {
    status: GaugeVec,
}

impl StatusSink {
    pub fn new(namespace: &str) -> Result<Self> {
        let status = GaugeVec::new(
            Opts::new("status", "The index status and state.")
                .namespace(namespace)
                .subsystem(SUBSYSTEM),
            &LABEL_NAMES,
        )?;
        Ok(Self { status })
    }

    /// Metric families observed so far
    pub fn into_families(self) -> Vec<MetricFamily> {
        self.status.collect()
    }
}

impl HealthSink for StatusSink {
    type Error = ExporterError;

    fn observe(&mut self, labels: &[&str; 12], value: f64) -> Result<()> {
        self.status.get_metric_with_label_values(labels)?.set(value);
        Ok(())
    }
}

/// Registry for all exporter metrics
pub struct IndexHealthMetricsRegistry {
    registry: Registry,
    namespace: String,
    scrape: ScrapeMetrics,
}

impl IndexHealthMetricsRegistry {
    /// Create a new metrics registry
    pub fn new(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        let registry = Registry::new();
        let scrape = ScrapeMetrics::new(&namespace, &registry)?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            namespace,
            scrape,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get scrape bookkeeping metrics
    pub fn scrape(&self) -> &ScrapeMetrics {
        &self.scrape
    }

    /// Fresh sink for one scrape's `status` series
    pub fn status_sink(&self) -> Result<StatusSink> {
        StatusSink::new(&self.namespace)
    }

    /// Gather the registered, process-scoped metric families
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Encode metric families as text for scraping
    pub fn encode_text(&self, mut families: Vec<MetricFamily>) -> Result<String> {
        // The text encoder rejects families without samples.
        families.retain(|family| !family.get_metric().is_empty());

        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ExporterError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels<'a>(index: &'a str, color: &'a str) -> [&'a str; 12] {
        [
            index, color, "open", "true", "1700000000000", "1", "1", "false", "false", "false",
            "false", "prod",
        ]
    }

    #[test]
    fn test_scrape_metrics() {
        let registry = IndexHealthMetricsRegistry::new("elasticsearch").unwrap();
        let scrape = registry.scrape();

        scrape.record_scrape();
        scrape.record_scrape();
        scrape.set_up(true);
        assert_eq!(scrape.total_scrapes(), 2);
        assert_eq!(scrape.up(), 1);
        assert_eq!(scrape.json_parse_failures(), 0);

        scrape.record_parse_failure();
        scrape.set_up(false);
        assert_eq!(scrape.up(), 0);
        assert_eq!(scrape.json_parse_failures(), 1);
    }

    #[test]
    fn test_series_names_follow_namespace_and_subsystem() {
        let registry = IndexHealthMetricsRegistry::new("search").unwrap();
        registry.scrape().record_scrape();

        let text = registry.encode_text(registry.gather()).unwrap();
        assert!(text.contains("search_index_health_up 0"));
        assert!(text.contains("search_index_health_total_scrapes 1"));
        assert!(text.contains("search_index_health_json_parse_failures 0"));
    }

    #[test]
    fn test_status_sink_renders_labels() {
        let registry = IndexHealthMetricsRegistry::new("elasticsearch").unwrap();
        let mut sink = registry.status_sink().unwrap();

        sink.observe(&labels("idx-red", "red"), 2.0).unwrap();

        let text = registry.encode_text(sink.into_families()).unwrap();
        assert!(text.contains("elasticsearch_index_health_status{"));
        assert!(text.contains("index=\"idx-red\""));
        assert!(text.contains("color=\"red\""));
        assert!(text.contains("es_cluster=\"prod\""));
        assert!(text.contains("} 2"));
    }

    #[test]
    fn test_empty_status_sink_encodes_nothing() {
        let registry = IndexHealthMetricsRegistry::new("elasticsearch").unwrap();
        let sink = registry.status_sink().unwrap();
        let text = registry.encode_text(sink.into_families()).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_sinks_are_independent_per_scrape() {
        let registry = IndexHealthMetricsRegistry::new("elasticsearch").unwrap();

        let mut sink = registry.status_sink().unwrap();
        sink.observe(&labels("idx-old", "green"), 0.0).unwrap();
        drop(sink);

        let second = registry.status_sink().unwrap();
        let text = registry.encode_text(second.into_families()).unwrap();
        assert!(!text.contains("idx-old"));
    }
}
