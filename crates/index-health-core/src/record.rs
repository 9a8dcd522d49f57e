//! Per-index health record produced by the aggregator

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::IndexMetadata;

/// Ordered health level derived from shard assignment
///
/// Variant order is the severity order, so `max` gives the worse of two.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Every shard copy is assigned
    #[default]
    #[serde(rename = "green")]
    Normal,
    /// At least one replica copy is unassigned
    #[serde(rename = "yellow")]
    Degraded,
    /// At least one primary copy is unassigned
    #[serde(rename = "red")]
    Critical,
}

impl Severity {
    /// Status word exported as the `color` label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "green",
            Severity::Degraded => "yellow",
            Severity::Critical => "red",
        }
    }

    /// Exported gauge value
    pub fn value(&self) -> f64 {
        match self {
            Severity::Normal => 0.0,
            Severity::Degraded => 1.0,
            Severity::Critical => 2.0,
        }
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access restrictions in effect on an index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessBlocks {
    pub read: bool,
    pub write: bool,
    pub metadata_read: bool,
    pub metadata_write: bool,
}

impl AccessBlocks {
    /// True when no restriction is set
    pub fn is_unrestricted(&self) -> bool {
        *self == AccessBlocks::default()
    }

    /// Combine with another set; restrictions are only ever added
    pub fn union(self, other: AccessBlocks) -> AccessBlocks {
        AccessBlocks {
            read: self.read || other.read,
            write: self.write || other.write,
            metadata_read: self.metadata_read || other.metadata_read,
            metadata_write: self.metadata_write || other.metadata_write,
        }
    }
}

/// Unified health view of a single index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub cluster: String,
    pub index: String,
    pub uuid: String,
    pub state: String,
    pub dynamic: String,
    pub creation_date: String,
    pub number_of_shards: String,
    pub number_of_replicas: String,
    pub blocks: AccessBlocks,
    pub severity: Severity,
}

impl HealthRecord {
    /// Build the base record for an index: fields copied from metadata,
    /// severity normal and no restrictions.
    pub fn new(cluster: impl Into<String>, index: impl Into<String>, meta: &IndexMetadata) -> Self {
        let settings = meta.settings();
        Self {
            cluster: cluster.into(),
            index: index.into(),
            uuid: settings.uuid.clone(),
            state: meta.state.clone(),
            dynamic: meta.dynamic_mode(),
            creation_date: settings.creation_date.clone(),
            number_of_shards: settings.number_of_shards.clone(),
            number_of_replicas: settings.number_of_replicas.clone(),
            blocks: AccessBlocks::default(),
            severity: Severity::Normal,
        }
    }

    /// Label values in [`crate::LABEL_NAMES`] order
    pub fn label_values(&self) -> [&str; 12] {
        [
            self.index.as_str(),
            self.severity.as_str(),
            self.state.as_str(),
            self.dynamic.as_str(),
            self.creation_date.as_str(),
            self.number_of_shards.as_str(),
            self.number_of_replicas.as_str(),
            bool_label(self.blocks.read),
            bool_label(self.blocks.write),
            bool_label(self.blocks.metadata_read),
            bool_label(self.blocks.metadata_write),
            self.cluster.as_str(),
        ]
    }
}

fn bool_label(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{IndexSettings, SettingsEnvelope};

    fn metadata() -> IndexMetadata {
        IndexMetadata {
            state: "open".to_string(),
            settings: SettingsEnvelope {
                index: IndexSettings {
                    creation_date: "1700000000000".to_string(),
                    number_of_shards: "2".to_string(),
                    number_of_replicas: "1".to_string(),
                    uuid: "u-1".to_string(),
                },
            },
            mappings: Default::default(),
        }
    }

    #[test]
    fn test_severity_order_and_words() {
        assert!(Severity::Normal < Severity::Degraded);
        assert!(Severity::Degraded < Severity::Critical);
        assert_eq!(Severity::Normal.max(Severity::Critical), Severity::Critical);

        assert_eq!(Severity::Normal.as_str(), "green");
        assert_eq!(Severity::Degraded.as_str(), "yellow");
        assert_eq!(Severity::Critical.as_str(), "red");
        assert_eq!(Severity::Degraded.value(), 1.0);
        assert_eq!(Severity::Critical.to_string(), "red");
        assert_eq!(serde_json::to_string(&Severity::Degraded).unwrap(), "\"yellow\"");
    }

    #[test]
    fn test_base_record_defaults() {
        let record = HealthRecord::new("prod", "idx", &metadata());
        assert_eq!(record.severity, Severity::Normal);
        assert!(record.blocks.is_unrestricted());
        assert_eq!(record.dynamic, "true");
        assert_eq!(record.uuid, "u-1");
        assert_eq!(record.number_of_shards, "2");
    }

    #[test]
    fn test_label_values_order() {
        let mut record = HealthRecord::new("prod", "idx", &metadata());
        record.blocks.write = true;
        record.severity = Severity::Degraded;

        assert_eq!(
            record.label_values(),
            [
                "idx",
                "yellow",
                "open",
                "true",
                "1700000000000",
                "2",
                "1",
                "false",
                "true",
                "false",
                "false",
                "prod",
            ]
        );
    }

    #[test]
    fn test_access_blocks_union_only_adds() {
        let read = AccessBlocks {
            read: true,
            ..Default::default()
        };
        let write = AccessBlocks {
            write: true,
            ..Default::default()
        };
        let both = read.union(write);
        assert!(both.read && both.write);
        assert_eq!(both.union(AccessBlocks::default()), both);
    }
}
