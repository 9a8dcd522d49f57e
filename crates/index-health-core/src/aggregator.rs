//! Index health aggregation
//!
//! Merges the three index-keyed sections of a cluster state snapshot into
//! one [`HealthRecord`] per index:
//!
//! 1. **Base construction** - one record per `metadata.indices` entry.
//!    Metadata is the universe; the other sections never create records.
//! 2. **Block overlay** - access flags from `blocks.indices`.
//! 3. **Routing overlay** - severity from `routing_table.indices`, the worst
//!    shard copy wins.
//!
//! Every pass is a lookup into the base mapping. A miss is a no-op, so
//! aggregation is total and never fails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::record::{AccessBlocks, HealthRecord, Severity};
use crate::snapshot::{BlockEntry, Blocks, ClusterStateSnapshot, IndexRouting, RoutingTable};

/// Health records keyed by index name
pub type HealthMap = BTreeMap<String, HealthRecord>;

const READ: &str = "read";
const WRITE: &str = "write";
const METADATA_READ: &str = "metadata_read";
const METADATA_WRITE: &str = "metadata_write";

/// How block level tokens map onto access flags
///
/// `Substring` keeps parity with the established exporter output: because
/// `read` is contained in `metadata_read` (and `write` in `metadata_write`),
/// a metadata-only block also raises the plain flag. `Exact` decouples them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMatching {
    #[default]
    Substring,
    Exact,
}

impl BlockMatching {
    fn matches(&self, level: &str, token: &str) -> bool {
        match self {
            BlockMatching::Substring => level.contains(token),
            BlockMatching::Exact => level == token,
        }
    }

    /// Access flags raised by a set of level tokens
    pub fn access_blocks<'a, I>(&self, levels: I) -> AccessBlocks
    where
        I: IntoIterator<Item = &'a str>,
    {
        levels
            .into_iter()
            .fold(AccessBlocks::default(), |acc, level| AccessBlocks {
                read: acc.read || self.matches(level, READ),
                write: acc.write || self.matches(level, WRITE),
                metadata_read: acc.metadata_read || self.matches(level, METADATA_READ),
                metadata_write: acc.metadata_write || self.matches(level, METADATA_WRITE),
            })
    }
}

impl fmt::Display for BlockMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockMatching::Substring => f.write_str("substring"),
            BlockMatching::Exact => f.write_str("exact"),
        }
    }
}

impl FromStr for BlockMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "substring" => Ok(BlockMatching::Substring),
            "exact" => Ok(BlockMatching::Exact),
            other => Err(format!(
                "unknown block matching mode '{}', expected 'substring' or 'exact'",
                other
            )),
        }
    }
}

/// Reduce the shard copies of one index to a severity.
///
/// Running maximum over every copy: an unassigned replica raises to
/// degraded, an unassigned primary raises to critical and ends the scan.
pub fn reduce_routing(routing: &IndexRouting) -> Severity {
    let mut severity = Severity::Normal;
    for copy in routing.copies() {
        if !copy.is_unassigned() {
            continue;
        }
        if copy.primary {
            return Severity::Critical;
        }
        severity = severity.max(Severity::Degraded);
    }
    severity
}

/// Merge-and-reduce engine over cluster state snapshots
#[derive(Debug, Clone, Default)]
pub struct IndexHealthAggregator {
    block_matching: BlockMatching,
}

impl IndexHealthAggregator {
    pub fn new(block_matching: BlockMatching) -> Self {
        Self { block_matching }
    }

    pub fn block_matching(&self) -> BlockMatching {
        self.block_matching
    }

    /// Build the health mapping for a snapshot
    pub fn aggregate(&self, snapshot: &ClusterStateSnapshot) -> HealthMap {
        let mut records = Self::base_records(snapshot);
        self.overlay_blocks(&mut records, &snapshot.blocks);
        Self::overlay_routing(&mut records, &snapshot.routing_table);

        tracing::debug!(
            cluster = %snapshot.cluster_name,
            indices = records.len(),
            red = records.values().filter(|r| r.severity.is_critical()).count(),
            yellow = records.values().filter(|r| r.severity == Severity::Degraded).count(),
            "Aggregated index health"
        );

        records
    }

    fn base_records(snapshot: &ClusterStateSnapshot) -> HealthMap {
        snapshot
            .metadata
            .indices
            .iter()
            .map(|(index, meta)| {
                (
                    index.clone(),
                    HealthRecord::new(snapshot.cluster_name.as_str(), index.as_str(), meta),
                )
            })
            .collect()
    }

    fn overlay_blocks(&self, records: &mut HealthMap, blocks: &Blocks) {
        for (index, entries) in &blocks.indices {
            let Some(record) = records.get_mut(index) else {
                continue;
            };
            let levels = entries
                .values()
                .flat_map(|entry: &BlockEntry| entry.levels.iter().map(String::as_str));
            record.blocks = record
                .blocks
                .union(self.block_matching.access_blocks(levels));
        }
    }

    fn overlay_routing(records: &mut HealthMap, routing_table: &RoutingTable) {
        for (index, routing) in &routing_table.indices {
            if let Some(record) = records.get_mut(index) {
                record.severity = record.severity.max(reduce_routing(routing));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{IndexMetadata, ShardCopy, ShardState};

    fn copy(state: ShardState, primary: bool) -> ShardCopy {
        ShardCopy {
            state,
            primary,
            node: (state != ShardState::Unassigned).then(|| "node-1".to_string()),
            ..Default::default()
        }
    }

    fn routing(shards: Vec<Vec<ShardCopy>>) -> IndexRouting {
        IndexRouting {
            shards: shards
                .into_iter()
                .enumerate()
                .map(|(n, copies)| (n.to_string(), copies))
                .collect(),
        }
    }

    fn block(levels: &[&str]) -> BlockEntry {
        BlockEntry {
            levels: levels.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_assigned_is_green() {
        let routing = routing(vec![
            vec![copy(ShardState::Started, true), copy(ShardState::Started, false)],
            vec![copy(ShardState::Relocating, true), copy(ShardState::Initializing, false)],
        ]);
        assert_eq!(reduce_routing(&routing), Severity::Normal);
    }

    #[test]
    fn test_unassigned_replica_is_yellow() {
        let routing = routing(vec![vec![
            copy(ShardState::Started, true),
            copy(ShardState::Unassigned, false),
        ]]);
        assert_eq!(reduce_routing(&routing), Severity::Degraded);
    }

    #[test]
    fn test_unassigned_primary_is_red_even_when_scanned_last() {
        let routing = routing(vec![
            vec![copy(ShardState::Started, true), copy(ShardState::Unassigned, false)],
            vec![copy(ShardState::Started, true), copy(ShardState::Unassigned, false)],
            vec![copy(ShardState::Started, false), copy(ShardState::Unassigned, true)],
        ]);
        assert_eq!(reduce_routing(&routing), Severity::Critical);
    }

    #[test]
    fn test_empty_routing_is_green() {
        assert_eq!(reduce_routing(&IndexRouting::default()), Severity::Normal);
    }

    #[test]
    fn test_substring_matching_couples_metadata_flags() {
        let blocks = BlockMatching::Substring.access_blocks(["metadata_write"]);
        assert!(blocks.metadata_write);
        assert!(blocks.write);
        assert!(!blocks.read);
        assert!(!blocks.metadata_read);

        let blocks = BlockMatching::Substring.access_blocks(["metadata_read"]);
        assert!(blocks.metadata_read);
        assert!(blocks.read);
        assert!(!blocks.write);
    }

    #[test]
    fn test_exact_matching_keeps_flags_independent() {
        let blocks = BlockMatching::Exact.access_blocks(["metadata_write"]);
        assert!(blocks.metadata_write);
        assert!(!blocks.write);

        let blocks = BlockMatching::Exact.access_blocks(["read", "metadata_read"]);
        assert!(blocks.read && blocks.metadata_read);
        assert!(!blocks.write && !blocks.metadata_write);
    }

    #[test]
    fn test_block_matching_parse() {
        assert_eq!("exact".parse::<BlockMatching>(), Ok(BlockMatching::Exact));
        assert_eq!(
            "Substring".parse::<BlockMatching>(),
            Ok(BlockMatching::Substring)
        );
        assert!("fuzzy".parse::<BlockMatching>().is_err());
        assert_eq!(BlockMatching::default().to_string(), "substring");
    }

    #[test]
    fn test_blocks_across_entries_are_combined() {
        let mut snapshot = ClusterStateSnapshot::default();
        snapshot
            .metadata
            .indices
            .insert("idx".to_string(), IndexMetadata::default());
        let entries = snapshot.blocks.indices.entry("idx".to_string()).or_default();
        entries.insert("5".to_string(), block(&["read"]));
        entries.insert("8".to_string(), block(&["write", "metadata_write"]));

        let records = IndexHealthAggregator::new(BlockMatching::Exact).aggregate(&snapshot);
        let blocks = records["idx"].blocks;
        assert!(blocks.read && blocks.write && blocks.metadata_write);
        assert!(!blocks.metadata_read);
    }

    #[test]
    fn test_empty_block_entries_leave_defaults() {
        let mut snapshot = ClusterStateSnapshot::default();
        snapshot
            .metadata
            .indices
            .insert("idx".to_string(), IndexMetadata::default());
        snapshot.blocks.indices.insert("idx".to_string(), BTreeMap::new());
        snapshot
            .blocks
            .indices
            .entry("idx2".to_string())
            .or_default()
            .insert("1".to_string(), block(&[]));

        let records = IndexHealthAggregator::default().aggregate(&snapshot);
        assert!(records["idx"].blocks.is_unrestricted());
    }
}
