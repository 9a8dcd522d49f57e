//! Index health aggregation over cluster state snapshots.
//!
//! This crate turns a decoded `_cluster/state` payload into one
//! [`HealthRecord`] per index and hands those records to a metrics sink.
//!
//! # Pipeline
//!
//! ```text
//! ClusterStateSnapshot ──► IndexHealthAggregator ──► HealthMap ──► emit_records ──► HealthSink
//!   metadata  (universe)     1. base construction
//!   blocks    (overlay)      2. block overlay
//!   routing   (overlay)      3. routing reduction
//! ```
//!
//! # Design Principles
//! - Stateless: every call builds and discards its own mapping
//! - Total: aggregation has no error path, lookup misses are no-ops
//! - No I/O: fetching and exporting live in the agent crate

pub mod aggregator;
pub mod emitter;
pub mod error;
pub mod record;
pub mod snapshot;

pub use aggregator::{reduce_routing, BlockMatching, HealthMap, IndexHealthAggregator};
pub use emitter::{emit_records, HealthSink, LABEL_NAMES};
pub use error::{Result, SnapshotError};
pub use record::{AccessBlocks, HealthRecord, Severity};
pub use snapshot::{
    BlockEntry, Blocks, ClusterStateSnapshot, IndexMetadata, IndexRouting, IndexSettings,
    Metadata, RoutingTable, SettingsEnvelope, ShardCopy, ShardState, TypeMapping,
};
