//! Client Usage Library
//!
//! Turns the client-count activity payload of a Vault cluster into records a dashboard can
//! index directly, and derives chart datasets from them. The engine is pure data
//! transformation: in-memory payload in, freshly built records out.
//!
//! ## Core Features
//!
//! - **Schema reconciliation**: legacy (`distinct_entities`, `non_entity_tokens`) and current
//!   (`entity_clients`, `non_entity_clients`) counts fold into one [`ClientCounts`] type
//! - **Month aggregation**: months sorted chronologically, namespaces and mounts keyed by
//!   label, "new clients" joined onto "total" at every level
//! - **Upgrade annotation**: version-history events matched to the month they landed in
//! - **Chart datasets**: grouped bars, tooltips, axis bounds and domain
//! - **Fail-open decoding**: partial or malformed payloads degrade to empty data, never errors
//!
//! ## Architecture Overview
//!
//! - [`models`] - raw payload types with lenient decoding, and output records
//! - [`normalize`] - count vocabulary normalization and flattening
//! - [`reshape`] - namespace/mount labeling
//! - [`aggregator`] - sorting, joining and keying months
//! - [`upgrades`] - version-history indexing and filtering
//! - [`chart`] - chart dataset derivation
//! - [`format`] - number formatting for tooltips and axes
//! - [`analyzer`] - file-level entry point used by the CLI
//! - [`display`] - terminal and JSON output
//! - [`config`] - configuration management with environment variable support
//! - [`logging`] - structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! ```rust
//! use client_usage::{aggregate_by_month, RawMonth};
//!
//! let months: Vec<RawMonth> = serde_json::from_str(r#"[
//!     {"timestamp": "2022-04-01T00:00:00Z", "counts": {"clients": 3, "entity_clients": 2, "non_entity_clients": 1}},
//!     {"timestamp": "2022-03-01T00:00:00Z", "counts": {"clients": 10, "distinct_entities": 6, "non_entity_tokens": 4}}
//! ]"#).unwrap();
//!
//! let records = aggregate_by_month(&months);
//! assert_eq!(records[0].month, "3/22");
//! assert_eq!(records[0].counts.entity_clients, Some(6));
//! ```

pub mod aggregator;
pub mod analyzer;
pub mod chart;
pub mod config;
pub mod display;
pub mod format;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod reshape;
pub mod timestamp_parser;
pub mod upgrades;

pub use aggregator::aggregate_by_month;
pub use analyzer::ClientUsageAnalyzer;
pub use models::*;
pub use normalize::ClientCounts;
pub use upgrades::{describe_upgrade, index_upgrades_by_month};
