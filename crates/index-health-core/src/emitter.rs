//! Hands finished health records to a metrics sink

use crate::aggregator::HealthMap;

/// Label names of the per-index status series, in emission order
pub const LABEL_NAMES: [&str; 12] = [
    "index",
    "color",
    "state",
    "dynamic",
    "creation_date",
    "number_of_shards",
    "number_of_replicas",
    "read",
    "write",
    "metadata_read",
    "metadata_write",
    "es_cluster",
];

/// Destination for per-index observations
pub trait HealthSink {
    /// Error raised by the sink
    type Error;

    /// Record one observation; `labels` follows [`LABEL_NAMES`] order
    fn observe(&mut self, labels: &[&str; 12], value: f64) -> Result<(), Self::Error>;
}

/// Emit one observation per record, with the severity as value.
///
/// Returns the number of observations handed to the sink.
pub fn emit_records<S: HealthSink>(records: &HealthMap, sink: &mut S) -> Result<usize, S::Error> {
    for record in records.values() {
        sink.observe(&record.label_values(), record.severity.value())?;
    }
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{HealthRecord, Severity};
    use crate::snapshot::IndexMetadata;

    #[derive(Default)]
    struct VecSink {
        observations: Vec<(Vec<String>, f64)>,
    }

    impl HealthSink for VecSink {
        type Error = std::convert::Infallible;

        fn observe(&mut self, labels: &[&str; 12], value: f64) -> Result<(), Self::Error> {
            self.observations
                .push((labels.iter().map(|l| l.to_string()).collect(), value));
            Ok(())
        }
    }

    struct FailingSink;

    impl HealthSink for FailingSink {
        type Error = String;

        fn observe(&mut self, labels: &[&str; 12], _value: f64) -> Result<(), Self::Error> {
            Err(format!("rejected {}", labels[0]))
        }
    }

    fn records() -> HealthMap {
        let mut red = HealthRecord::new("prod", "idx-red", &IndexMetadata::default());
        red.severity = Severity::Critical;
        let green = HealthRecord::new("prod", "idx-green", &IndexMetadata::default());
        [red, green]
            .into_iter()
            .map(|r| (r.index.clone(), r))
            .collect()
    }

    #[test]
    fn test_emits_one_observation_per_record() {
        let mut sink = VecSink::default();
        let emitted = emit_records(&records(), &mut sink).unwrap();
        assert_eq!(emitted, 2);

        let red = sink
            .observations
            .iter()
            .find(|(labels, _)| labels[0] == "idx-red")
            .unwrap();
        assert_eq!(red.1, 2.0);
        assert_eq!(red.0[1], "red");
        assert_eq!(red.0[11], "prod");
    }

    #[test]
    fn test_empty_mapping_emits_nothing() {
        let mut sink = VecSink::default();
        assert_eq!(emit_records(&HealthMap::new(), &mut sink).unwrap(), 0);
        assert!(sink.observations.is_empty());
    }

    #[test]
    fn test_sink_error_propagates() {
        let err = emit_records(&records(), &mut FailingSink).unwrap_err();
        assert!(err.starts_with("rejected"));
    }
}
