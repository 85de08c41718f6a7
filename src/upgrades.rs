//! Version Upgrade Annotations
//!
//! Matches version-history events to months so charts can flag the month an upgrade
//! landed in. The index is a plain lookup table built once per rendering pass.

use crate::models::UpgradeEvent;
use crate::timestamp_parser::TimestampParser;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Release series whose first upgrade changed how clients are counted.
pub const NOTEWORTHY_SERIES: [&str; 3] = ["1.9", "1.10", "1.17"];

/// Index upgrade events by the `M/yy` label of their install month.
///
/// Two upgrades in the same month: the later entry in the list wins.
pub fn index_upgrades_by_month(upgrades: &[UpgradeEvent]) -> BTreeMap<String, UpgradeEvent> {
    let mut index = BTreeMap::new();
    for upgrade in upgrades {
        match TimestampParser::month_label(&upgrade.timestamp_installed) {
            Ok(month) => {
                index.insert(month, upgrade.clone());
            }
            Err(e) => {
                debug!(
                    version = %upgrade.version,
                    error = %e,
                    "Skipping upgrade with unparsable install time"
                );
            }
        }
    }
    index
}

/// `Vault was upgraded [from <previous> ]to <version>`, or `None` without a version.
pub fn describe_upgrade(event: &UpgradeEvent) -> Option<String> {
    if event.version.is_empty() {
        return None;
    }
    Some(match event.previous_version.as_deref() {
        Some(previous) if !previous.is_empty() => {
            format!("Vault was upgraded from {} to {}", previous, event.version)
        }
        _ => format!("Vault was upgraded to {}", event.version),
    })
}

/// Upgrade message for a month label, if an upgrade landed that month.
pub fn upgrade_message(index: &BTreeMap<String, UpgradeEvent>, month: &str) -> Option<String> {
    index.get(month).and_then(describe_upgrade)
}

fn release_series(version: &str) -> Option<&'static str> {
    NOTEWORTHY_SERIES.iter().copied().find(|series| {
        version == *series
            || version
                .strip_prefix(series)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Noteworthy upgrades installed within `[start, end]`, in input order.
///
/// Only the first upgrade into each series in [`NOTEWORTHY_SERIES`] counts; later patch
/// releases of the same series are ignored.
pub fn filter_version_history(
    history: &[UpgradeEvent],
    start: &str,
    end: &str,
) -> Vec<UpgradeEvent> {
    let mut seen = HashSet::new();
    let noteworthy: Vec<&UpgradeEvent> = history
        .iter()
        .filter(|event| match release_series(&event.version) {
            Some(series) => seen.insert(series),
            None => false,
        })
        .collect();

    if noteworthy.is_empty() {
        return Vec::new();
    }

    let (start, end) = match (TimestampParser::parse(start), TimestampParser::parse(end)) {
        (Ok(start), Ok(end)) => (start, end),
        _ => {
            debug!(start, end, "Unparsable activity range, no upgrades selected");
            return Vec::new();
        }
    };

    noteworthy
        .into_iter()
        .filter(|event| match TimestampParser::parse(&event.timestamp_installed) {
            Ok(installed) => installed >= start && installed <= end,
            Err(e) => {
                debug!(version = %event.version, error = %e, "Dropping upgrade with unparsable install time");
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_with_previous_version() {
        let event = UpgradeEvent::new("2022-03-15", "1.10.0", Some("1.9.0"));
        assert_eq!(
            describe_upgrade(&event).as_deref(),
            Some("Vault was upgraded from 1.9.0 to 1.10.0")
        );
    }

    #[test]
    fn test_describe_first_install() {
        let event = UpgradeEvent::new("2022-03-15", "1.9.0", None);
        assert_eq!(
            describe_upgrade(&event).as_deref(),
            Some("Vault was upgraded to 1.9.0")
        );
    }

    #[test]
    fn test_index_keys_by_month_label() {
        let index = index_upgrades_by_month(&[
            UpgradeEvent::new("2022-03-15", "1.10.0", Some("1.9.0")),
            UpgradeEvent::new("garbage", "1.11.0", Some("1.10.0")),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(
            upgrade_message(&index, "3/22").as_deref(),
            Some("Vault was upgraded from 1.9.0 to 1.10.0")
        );
        assert_eq!(upgrade_message(&index, "4/22"), None);
    }

    #[test]
    fn test_release_series_is_prefix_by_component() {
        assert_eq!(release_series("1.9.0"), Some("1.9"));
        assert_eq!(release_series("1.10.1"), Some("1.10"));
        assert_eq!(release_series("1.19.0"), None);
        assert_eq!(release_series("1.17"), Some("1.17"));
    }
}
