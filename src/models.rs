//! Core Data Models
//!
//! This module defines the data structures used throughout the client usage pipeline,
//! from the raw activity payload to the keyed records consumed by charts and reports.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`RawMonth`], [`RawNamespace`], [`RawMount`] - decoded from the activity API
//! 2. **Aggregation**: [`MonthRecord`] - one per month, namespaces and mounts keyed by label
//! 3. **Annotation**: [`UpgradeEvent`] - version-history entries matched to months
//!
//! ## Lenient Decoding
//!
//! The payload comes from an external backend and has changed shape over time. Decoding
//! never fails on partial data:
//!
//! - `null` or missing `counts`, `namespaces`, `mounts`, `new_clients` decode as absent
//! - a non-array where an array is expected decodes as absent
//! - malformed elements inside an array are skipped
//!
//! Every such decision is traced with `warn!` so bad payloads remain visible in logs.
//!
//! ## Output Records
//!
//! - [`MonthRecord`] - month label, totals, `namespaces_by_key`, `new_clients`
//! - [`NamespaceRecord`] - month label, totals, `mounts_by_key`, `new_clients`
//! - [`MountRecord`] - month label, totals, `new_clients`
//! - [`NewClientsRecord`] - month label and counts of clients first seen that month

use crate::normalize::{ClientCounts, CountsCarrier};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// A counts object exactly as the API sent it, in either vocabulary.
pub type RawCounts = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMount {
    #[serde(default, deserialize_with = "lenient_string")]
    pub mount_path: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub counts: Option<RawCounts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNamespace {
    #[serde(default, deserialize_with = "lenient_string")]
    pub namespace_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub namespace_path: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub counts: Option<RawCounts>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub mounts: Option<Vec<RawMount>>,
}

/// The `new_clients` sub-tree of a month: same shape as the month itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNewClients {
    #[serde(default, deserialize_with = "lenient_object")]
    pub counts: Option<RawCounts>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub namespaces: Option<Vec<RawNamespace>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMonth {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient_object")]
    pub counts: Option<RawCounts>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub namespaces: Option<Vec<RawNamespace>>,
    #[serde(default, deserialize_with = "lenient_struct")]
    pub new_clients: Option<RawNewClients>,
}

/// The activity endpoint's response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub months: Option<Vec<RawMonth>>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub by_namespace: Option<Vec<RawNamespace>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub total: Option<RawCounts>,
}

impl ActivityResponse {
    /// Decode either the full envelope or a bare array of months.
    pub fn from_value(value: Value) -> Self {
        if value.is_array() {
            return Self {
                months: decode_seq(value),
                ..Default::default()
            };
        }
        if !value.is_object() {
            warn!(kind = value_kind(&value), "Activity payload is not an object or array");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(error = %e, "Activity payload did not match the expected envelope");
            Self::default()
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(content).context("Activity payload is not valid JSON")?;
        Ok(Self::from_value(value))
    }

    pub fn months(&self) -> &[RawMonth] {
        self.months.as_deref().unwrap_or_default()
    }
}

/// One entry of the version-history API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeEvent {
    #[serde(alias = "timestampInstalled", default, deserialize_with = "lenient_string")]
    pub timestamp_installed: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: String,
    #[serde(
        alias = "previousVersion",
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_version: Option<String>,
}

impl UpgradeEvent {
    pub fn new(timestamp_installed: &str, version: &str, previous_version: Option<&str>) -> Self {
        Self {
            timestamp_installed: timestamp_installed.to_string(),
            version: version.to_string(),
            previous_version: previous_version.map(str::to_string),
        }
    }

    /// Decode a version-history list. Anything that is not an array yields no events.
    pub fn list_from_value(value: Value) -> Vec<UpgradeEvent> {
        decode_seq(value).unwrap_or_default()
    }

    pub fn list_from_json_str(content: &str) -> Result<Vec<UpgradeEvent>> {
        let value: Value =
            serde_json::from_str(content).context("Version history is not valid JSON")?;
        Ok(Self::list_from_value(value))
    }
}

/// Counts of clients first seen in a month, at any level of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewClientsRecord {
    pub month: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
}

impl NewClientsRecord {
    pub fn new(month: &str, counts: ClientCounts) -> Self {
        Self {
            month: month.to_string(),
            counts,
        }
    }

    /// The `{month}` placeholder attached when the "new" tree has no match.
    pub fn empty(month: &str) -> Self {
        Self::new(month, ClientCounts::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MountRecord {
    pub month: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
    pub new_clients: NewClientsRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamespaceRecord {
    pub month: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
    pub mounts_by_key: BTreeMap<String, MountRecord>,
    pub new_clients: NewClientsRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthRecord {
    pub month: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
    pub namespaces_by_key: BTreeMap<String, NamespaceRecord>,
    pub new_clients: NewClientsRecord,
}

impl CountsCarrier for RawMonth {
    fn raw_counts(&self) -> Option<&RawCounts> {
        self.counts.as_ref()
    }
}

impl CountsCarrier for RawNewClients {
    fn raw_counts(&self) -> Option<&RawCounts> {
        self.counts.as_ref()
    }
}

impl CountsCarrier for RawNamespace {
    fn raw_counts(&self) -> Option<&RawCounts> {
        self.counts.as_ref()
    }
}

impl CountsCarrier for RawMount {
    fn raw_counts(&self) -> Option<&RawCounts> {
        self.counts.as_ref()
    }
}

impl CountsCarrier for ActivityResponse {
    fn raw_counts(&self) -> Option<&RawCounts> {
        self.total.as_ref()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn decode_seq<T: DeserializeOwned>(value: Value) -> Option<Vec<T>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match serde_json::from_value(item) {
                    Ok(decoded) => Some(decoded),
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed entry");
                        None
                    }
                })
                .collect(),
        ),
        Value::Null => None,
        other => {
            warn!(kind = value_kind(&other), "Expected an array, treating as absent");
            None
        }
    }
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(decode_seq))
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Option<RawCounts>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(other) => {
            warn!(kind = value_kind(&other), "Expected an object, treating as absent");
            Ok(None)
        }
    }
}

fn lenient_struct<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => Ok(serde_json::from_value(value)
            .map_err(|e| warn!(error = %e, "Skipping malformed object"))
            .ok()),
        Some(Value::Null) | None => Ok(None),
        Some(other) => {
            warn!(kind = value_kind(&other), "Expected an object, treating as absent");
            Ok(None)
        }
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_string(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_fields_decode_as_absent() {
        let month: RawMonth = serde_json::from_value(json!({
            "timestamp": "2021-06-01T00:00:00Z",
            "counts": null,
            "namespaces": null,
            "new_clients": null
        }))
        .unwrap();
        assert_eq!(month.counts, None);
        assert_eq!(month.namespaces, None);
        assert_eq!(month.new_clients, None);
    }

    #[test]
    fn test_non_array_namespaces_decode_as_absent() {
        let month: RawMonth = serde_json::from_value(json!({
            "timestamp": "2021-06-01T00:00:00Z",
            "counts": {"clients": 1},
            "namespaces": {"foo": "bar"}
        }))
        .unwrap();
        assert_eq!(month.namespaces, None);
        assert!(month.counts.is_some());
    }

    #[test]
    fn test_malformed_mount_is_skipped() {
        let ns: RawNamespace = serde_json::from_value(json!({
            "namespace_id": "root",
            "namespace_path": null,
            "mounts": [{"mount_path": "auth/up1/", "counts": {"clients": 1}}, "garbage"]
        }))
        .unwrap();
        assert_eq!(ns.namespace_path, "");
        assert_eq!(ns.mounts.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_activity_response_accepts_bare_array() {
        let response = ActivityResponse::from_value(json!([
            {"timestamp": "2022-03-01T00:00:00Z", "counts": {"clients": 1}}
        ]));
        assert_eq!(response.months().len(), 1);
        assert_eq!(response.start_time, None);
    }

    #[test]
    fn test_activity_response_envelope() {
        let response = ActivityResponse::from_value(json!({
            "start_time": "2023-08-01T00:00:00Z",
            "end_time": "2023-09-30T23:59:59Z",
            "months": [{"timestamp": "2023-08-01T00:00:00Z", "counts": null}],
            "total": {"clients": 4}
        }));
        assert_eq!(response.start_time.as_deref(), Some("2023-08-01T00:00:00Z"));
        assert_eq!(response.months().len(), 1);
        assert!(response.total.is_some());
    }

    #[test]
    fn test_upgrade_history_accepts_camel_case() {
        let events = UpgradeEvent::list_from_value(json!([
            {"version": "1.9.1", "previousVersion": "1.9.0", "timestampInstalled": "2023-08-02T00:00:00Z"}
        ]));
        assert_eq!(events[0].previous_version.as_deref(), Some("1.9.0"));
        assert_eq!(events[0].timestamp_installed, "2023-08-02T00:00:00Z");
    }

    #[test]
    fn test_upgrade_history_non_array_is_empty() {
        assert!(UpgradeEvent::list_from_value(json!({"foo": "bar"})).is_empty());
    }

    #[test]
    fn test_empty_new_clients_serializes_to_month_only() {
        let record = NewClientsRecord::empty("3/22");
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"month": "3/22"}));
    }
}
