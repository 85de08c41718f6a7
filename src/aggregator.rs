//! Month Aggregation
//!
//! Turns the activity API's array of months into [`MonthRecord`]s: one per month with
//! counts, sorted chronologically, with namespaces and mounts keyed by label and the
//! "new clients" sub-tree joined onto the "total" tree at every level.
//!
//! ## Pipeline
//!
//! 1. **Sort**: months ascending by parsed timestamp, regardless of input order
//! 2. **Skip**: months without a `counts` summary produce no record
//! 3. **Reshape**: total and new namespaces via [`reshape_namespaces`]
//! 4. **Join**: each total namespace (and mount) picks up its match from the new tree,
//!    or an empty `{month}` record when there is none
//!
//! ## Join Direction
//!
//! The join is driven by the total tree. A namespace or mount that appears only in the new
//! tree has nowhere to attach and is dropped; [`orphaned_new_clients`] reports those labels
//! and the aggregator logs them at `warn` level.

use crate::models::{MonthRecord, MountRecord, NamespaceRecord, NewClientsRecord, RawMonth};
use crate::normalize::flatten;
use crate::reshape::{find_namespace, reshape_namespaces, LabeledNamespace};
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Stable ascending sort by parsed timestamp.
///
/// Unparsable timestamps sort first; they never abort the sort.
pub fn sort_months_by_timestamp(months: &[RawMonth]) -> Vec<&RawMonth> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &RawMonth)> = months
        .iter()
        .map(|month| (TimestampParser::parse(&month.timestamp).ok(), month))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, month)| month).collect()
}

/// Month label for a raw timestamp, e.g. `2022-03-01T00:00:00Z` -> `3/22`.
///
/// Falls back to the raw string when it cannot be parsed.
pub fn month_label(timestamp: &str) -> String {
    TimestampParser::month_label(timestamp).unwrap_or_else(|e| {
        warn!(timestamp, error = %e, "Unparsable month timestamp, using it verbatim");
        timestamp.to_string()
    })
}

/// Key namespaces by label, joining each with its match in the new-clients tree.
pub fn namespaces_to_keyed(
    total: &[LabeledNamespace],
    new: &[LabeledNamespace],
    month: &str,
) -> BTreeMap<String, NamespaceRecord> {
    total
        .iter()
        .map(|namespace| {
            let new_namespace = find_namespace(new, &namespace.label);
            let mounts_by_key = namespace
                .mounts
                .iter()
                .map(|mount| {
                    let new_clients = new_namespace
                        .and_then(|ns| ns.find_mount(&mount.label))
                        .map(|m| NewClientsRecord::new(month, m.counts.clone()))
                        .unwrap_or_else(|| NewClientsRecord::empty(month));
                    let record = MountRecord {
                        month: month.to_string(),
                        counts: mount.counts.clone(),
                        new_clients,
                    };
                    (mount.label.clone(), record)
                })
                .collect();
            let new_clients = new_namespace
                .map(|ns| NewClientsRecord::new(month, ns.counts.clone()))
                .unwrap_or_else(|| NewClientsRecord::empty(month));
            let record = NamespaceRecord {
                month: month.to_string(),
                counts: namespace.counts.clone(),
                mounts_by_key,
                new_clients,
            };
            (namespace.label.clone(), record)
        })
        .collect()
}

/// Labels in the new-clients tree with no counterpart in the total tree.
///
/// Namespace orphans are reported by label; mount orphans as `namespace:mount`.
pub fn orphaned_new_clients(total: &[LabeledNamespace], new: &[LabeledNamespace]) -> Vec<String> {
    let mut orphans = Vec::new();
    for new_namespace in new {
        match find_namespace(total, &new_namespace.label) {
            None => orphans.push(new_namespace.label.clone()),
            Some(total_namespace) => {
                for mount in &new_namespace.mounts {
                    if total_namespace.find_mount(&mount.label).is_none() {
                        orphans.push(format!("{}:{}", new_namespace.label, mount.label));
                    }
                }
            }
        }
    }
    orphans
}

/// Aggregate one month, or `None` when it has no counts summary.
pub fn aggregate_month(raw: &RawMonth) -> Option<MonthRecord> {
    if raw.counts.is_none() {
        debug!(timestamp = %raw.timestamp, "Skipping month without counts");
        return None;
    }

    let month = month_label(&raw.timestamp);
    let total = reshape_namespaces(raw.namespaces.as_deref().unwrap_or_default());
    let new = raw
        .new_clients
        .as_ref()
        .and_then(|new_clients| new_clients.namespaces.as_deref())
        .map(reshape_namespaces)
        .unwrap_or_default();

    let orphans = orphaned_new_clients(&total, &new);
    if !orphans.is_empty() {
        warn!(
            month = %month,
            orphans = ?orphans,
            "New-client entries without a matching total entry were not attached"
        );
    }

    let new_counts = raw.new_clients.as_ref().map(flatten).unwrap_or_default();

    Some(MonthRecord {
        counts: flatten(raw),
        namespaces_by_key: namespaces_to_keyed(&total, &new, &month),
        new_clients: NewClientsRecord::new(&month, new_counts),
        month,
    })
}

/// Aggregate months in any order into chronologically sorted records.
///
/// Months without counts are left out, so the result may be shorter than the input.
pub fn aggregate_by_month(months: &[RawMonth]) -> Vec<MonthRecord> {
    let records: Vec<MonthRecord> = sort_months_by_timestamp(months)
        .into_iter()
        .filter_map(aggregate_month)
        .collect();
    debug!(input = months.len(), output = records.len(), "Aggregated months");
    records
}
