//! Typed model of the `_cluster/state` sections consumed by the aggregator
//!
//! Three sections are read, all keyed by index name:
//! - `metadata.indices` - the universe of indices and their settings
//! - `blocks.indices` - access restrictions per index
//! - `routing_table.indices` - shard copy placement per index
//!
//! Every struct decodes with `#[serde(default)]` and every non-optional
//! field goes through `null_as_default`, so fields that are missing or
//! explicitly `null` become empty values rather than decode failures.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, SnapshotError};

/// Dynamic mapping mode reported when no type mapping sets one
pub const DEFAULT_DYNAMIC_MODE: &str = "true";

/// Decoded cluster state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterStateSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub cluster_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cluster_uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub state_uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub master_node: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    #[serde(deserialize_with = "null_as_default")]
    pub blocks: Blocks,
    #[serde(deserialize_with = "null_as_default")]
    pub routing_table: RoutingTable,
}

impl ClusterStateSnapshot {
    /// Decode a snapshot from a raw JSON payload
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SnapshotError::Empty);
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice(json.as_bytes())
    }
}

/// `metadata` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(deserialize_with = "null_as_default")]
    pub cluster_uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub indices: BTreeMap<String, IndexMetadata>,
}

/// Per-index metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexMetadata {
    /// `open` or `close`
    #[serde(deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub settings: SettingsEnvelope,
    /// Keyed by mapping type name
    #[serde(deserialize_with = "null_as_default")]
    pub mappings: BTreeMap<String, TypeMapping>,
}

impl IndexMetadata {
    pub fn settings(&self) -> &IndexSettings {
        &self.settings.index
    }

    /// First non-empty `dynamic` setting across the type mappings, in type
    /// name order, falling back to [`DEFAULT_DYNAMIC_MODE`].
    pub fn dynamic_mode(&self) -> String {
        self.mappings
            .values()
            .find_map(TypeMapping::dynamic_mode)
            .unwrap_or_else(|| DEFAULT_DYNAMIC_MODE.to_string())
    }
}

/// Wrapper matching the `settings.index` nesting of the payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsEnvelope {
    #[serde(deserialize_with = "null_as_default")]
    pub index: IndexSettings,
}

/// Index settings. The cluster reports every value as a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    #[serde(deserialize_with = "lenient_string")]
    pub creation_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub number_of_shards: String,
    #[serde(deserialize_with = "lenient_string")]
    pub number_of_replicas: String,
    #[serde(deserialize_with = "lenient_string")]
    pub uuid: String,
}

/// A single type mapping; only the `dynamic` setting is of interest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<Value>,
}

impl TypeMapping {
    /// The `dynamic` setting as a label value, if it carries one
    pub fn dynamic_mode(&self) -> Option<String> {
        match self.dynamic.as_ref()? {
            Value::String(mode) if !mode.is_empty() => Some(mode.clone()),
            Value::Bool(enabled) => Some(enabled.to_string()),
            _ => None,
        }
    }
}

/// `blocks` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blocks {
    /// Cluster-wide blocks, keyed by block id
    #[serde(deserialize_with = "null_as_default")]
    pub global: BTreeMap<String, BlockEntry>,
    /// Index blocks, keyed by index name then block id
    #[serde(deserialize_with = "null_as_default")]
    pub indices: BTreeMap<String, BTreeMap<String, BlockEntry>>,
}

/// A single access restriction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub retryable: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub levels: Vec<String>,
}

/// `routing_table` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingTable {
    #[serde(deserialize_with = "null_as_default")]
    pub indices: BTreeMap<String, IndexRouting>,
}

/// Shard placement of one index, keyed by shard number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRouting {
    #[serde(deserialize_with = "null_as_default")]
    pub shards: BTreeMap<String, Vec<ShardCopy>>,
}

impl IndexRouting {
    /// Every shard copy, shard by shard
    pub fn copies(&self) -> impl Iterator<Item = &ShardCopy> {
        self.shards.values().flatten()
    }
}

/// One physical copy of a shard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardCopy {
    #[serde(deserialize_with = "null_as_default")]
    pub state: ShardState,
    #[serde(deserialize_with = "null_as_default")]
    pub primary: bool,
    pub node: Option<String>,
    pub relocating_node: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub shard: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub index: String,
}

impl ShardCopy {
    pub fn is_unassigned(&self) -> bool {
        self.state == ShardState::Unassigned
    }
}

/// Routing state of a shard copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShardState {
    Unassigned,
    Initializing,
    Started,
    Relocating,
    /// Missing or unrecognized state; treated as assigned
    #[default]
    #[serde(other)]
    Unknown,
}

/// Decode `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Accept strings, numbers, booleans and `null` for scalar settings
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a scalar setting, found {}",
            other
        ))),
    }
}
