//! Index Health Exporter
//!
//! Polls a cluster's `_cluster/state` endpoint on every Prometheus scrape and
//! publishes one `<namespace>_index_health_status` series per index, valued
//! 0 (green), 1 (yellow) or 2 (red).
//!
//! # Design Principles
//! - Stateless: each scrape builds and discards its own health mapping
//! - Fail closed: a failed poll exports `up 0` and no index series
//! - Traceable: every poll is logged with its own poll id

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod handler;
pub mod telemetry;

pub use collector::{IndexHealthCollector, Scrape};
pub use config::{ExporterConfig, LogFormat};
pub use error::{ExporterError, Result};
