//! Chart Dataset Builder
//!
//! Derives everything a bar chart needs from a series of monthly records:
//!
//! - [`bar_dataset`] - `{timestamp, counts, clientType}` triples, one per bar
//! - [`aggregate_tooltips`] - per-point maximum and tooltip legend text
//! - [`y_axis_bounds`] - `[0, max]`, never narrower than `[0, 4]`
//! - [`x_axis_domain`] - distinct timestamps in input order
//! - [`upgrade_tooltip`] - upgrade message for the point's month
//! - [`y_axis_ticks`] - evenly spaced Y ticks, labeled with [`format_axis_label`]
//! - [`calculate_average`] - per-month mean of one client type
//!
//! Months, namespaces, mounts and new-client records all share the monthly shape and
//! implement [`ChartDatum`], so any of them can be charted directly. [`series_for`] builds
//! a filtered series (one namespace or mount, totals or new clients) from month records.
//!
//! "No data" and zero are different states: a point where no legend key has a value
//! reports `max: None` and the tooltip `["No data"]`.

use crate::format::{format_axis_label, format_number};
use crate::models::{MonthRecord, MountRecord, NamespaceRecord, NewClientsRecord, UpgradeEvent};
use crate::normalize::ClientCounts;
use crate::upgrades::upgrade_message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smallest Y-axis upper bound; keeps tick labels integral for tiny ranges.
pub const MIN_Y_AXIS_UPPER: u64 = 4;

pub const NO_DATA: &str = "No data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Clients,
    EntityClients,
    NonEntityClients,
}

impl ClientType {
    pub fn key(&self) -> &'static str {
        match self {
            ClientType::Clients => "clients",
            ClientType::EntityClients => "entity_clients",
            ClientType::NonEntityClients => "non_entity_clients",
        }
    }

    pub fn count(&self, counts: &ClientCounts) -> Option<u64> {
        match self {
            ClientType::Clients => counts.clients,
            ClientType::EntityClients => counts.entity_clients,
            ClientType::NonEntityClients => counts.non_entity_clients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub key: ClientType,
    pub label: String,
}

impl LegendEntry {
    pub fn new(key: ClientType, label: &str) -> Self {
        Self {
            key,
            label: label.to_string(),
        }
    }
}

/// Entity / non-entity split used by the monthly usage charts.
pub fn default_legend() -> Vec<LegendEntry> {
    vec![
        LegendEntry::new(ClientType::EntityClients, "entity clients"),
        LegendEntry::new(ClientType::NonEntityClients, "non-entity clients"),
    ]
}

/// A point on the X axis with client counts.
pub trait ChartDatum {
    /// X-axis value; the month label for aggregated records.
    fn timestamp(&self) -> &str;

    fn counts(&self) -> &ClientCounts;

    fn value(&self, key: ClientType) -> Option<u64> {
        key.count(self.counts())
    }
}

macro_rules! impl_chart_datum {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ChartDatum for $ty {
                fn timestamp(&self) -> &str {
                    &self.month
                }

                fn counts(&self) -> &ClientCounts {
                    &self.counts
                }
            }
        )*
    };
}

impl_chart_datum!(MonthRecord, NamespaceRecord, MountRecord, NewClientsRecord);

/// A standalone chart point, used for filtered series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: String,
    #[serde(flatten)]
    pub counts: ClientCounts,
}

impl ChartPoint {
    pub fn new(timestamp: &str, counts: ClientCounts) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            counts,
        }
    }
}

impl ChartDatum for ChartPoint {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn counts(&self) -> &ClientCounts {
        &self.counts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarDatum {
    pub timestamp: String,
    pub counts: Option<u64>,
    #[serde(rename = "clientType")]
    pub client_type: ClientType,
}

/// Grouped bar tuples.
///
/// One flat record per legend key per datum, grouped by timestamp, then value, then client
/// type. Each level keeps first-appearance order, which drives series color assignment;
/// identical tuples collapse into one.
pub fn bar_dataset<D: ChartDatum>(legend: &[LegendEntry], data: &[D]) -> Vec<BarDatum> {
    type ValueGroups = Vec<(Option<u64>, Vec<ClientType>)>;
    let mut groups: Vec<(&str, ValueGroups)> = Vec::new();

    for entry in legend {
        for datum in data {
            let timestamp = datum.timestamp();
            let value = datum.value(entry.key);

            let slot = match groups.iter().position(|(ts, _)| *ts == timestamp) {
                Some(i) => i,
                None => {
                    groups.push((timestamp, Vec::new()));
                    groups.len() - 1
                }
            };
            let by_value = &mut groups[slot].1;
            let slot = match by_value.iter().position(|(v, _)| *v == value) {
                Some(i) => i,
                None => {
                    by_value.push((value, Vec::new()));
                    by_value.len() - 1
                }
            };
            let types = &mut by_value[slot].1;
            if !types.contains(&entry.key) {
                types.push(entry.key);
            }
        }
    }

    groups
        .into_iter()
        .flat_map(|(timestamp, by_value)| {
            by_value.into_iter().flat_map(move |(counts, types)| {
                types.into_iter().map(move |client_type| BarDatum {
                    timestamp: timestamp.to_string(),
                    counts,
                    client_type,
                })
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooltipDatum {
    pub x: String,
    /// Plot height; `0` for a no-data point.
    pub y: u64,
    /// Largest legend value, `None` when no legend key had a value.
    pub max: Option<u64>,
    pub tooltip: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<String>,
}

/// Legend text for one datum: `"<count> <label>"` per key, or `["No data"]`.
///
/// A key without a value on a point that has data renders as `-`.
pub fn tooltip_legend<D: ChartDatum>(legend: &[LegendEntry], datum: &D) -> Vec<String> {
    if max_value(legend, datum).is_none() {
        return vec![NO_DATA.to_string()];
    }
    legend
        .iter()
        .map(|entry| match datum.value(entry.key) {
            Some(n) => format!("{} {}", format_number(n), entry.label),
            None => format!("- {}", entry.label),
        })
        .collect()
}

fn max_value<D: ChartDatum>(legend: &[LegendEntry], datum: &D) -> Option<u64> {
    legend.iter().filter_map(|entry| datum.value(entry.key)).max()
}

/// Per-point maxima and tooltip text, annotated with upgrades from `upgrades`.
pub fn aggregate_tooltips<D: ChartDatum>(
    legend: &[LegendEntry],
    data: &[D],
    upgrades: &BTreeMap<String, UpgradeEvent>,
) -> Vec<TooltipDatum> {
    data.iter()
        .map(|datum| {
            let max = max_value(legend, datum);
            TooltipDatum {
                x: datum.timestamp().to_string(),
                y: max.unwrap_or(0),
                max,
                tooltip: tooltip_legend(legend, datum),
                upgrade: upgrade_tooltip(datum, upgrades),
            }
        })
        .collect()
}

/// `[0, max]`, with the upper bound raised to [`MIN_Y_AXIS_UPPER`] for small ranges.
pub fn y_bounds_from_maxima(maxima: &[u64]) -> [u64; 2] {
    let upper = maxima.iter().copied().max().unwrap_or(0);
    [0, upper.max(MIN_Y_AXIS_UPPER)]
}

pub fn y_axis_bounds(tooltips: &[TooltipDatum]) -> [u64; 2] {
    let maxima: Vec<u64> = tooltips.iter().map(|t| t.y).collect();
    y_bounds_from_maxima(&maxima)
}

/// Distinct timestamps in input order.
pub fn x_axis_domain<D: ChartDatum>(data: &[D]) -> Vec<String> {
    let mut domain: Vec<String> = Vec::new();
    for datum in data {
        if !domain.iter().any(|ts| ts == datum.timestamp()) {
            domain.push(datum.timestamp().to_string());
        }
    }
    domain
}

pub fn upgrade_tooltip<D: ChartDatum>(
    datum: &D,
    upgrades: &BTreeMap<String, UpgradeEvent>,
) -> Option<String> {
    upgrade_message(upgrades, datum.timestamp())
}

/// Rounded mean of `key`; a point without a value counts as zero.
pub fn calculate_average<D: ChartDatum>(data: &[D], key: ClientType) -> Option<u64> {
    if data.is_empty() {
        return None;
    }
    let sum: u128 = data
        .iter()
        .map(|datum| u128::from(datum.value(key).unwrap_or(0)))
        .sum();
    let len = data.len() as u128;
    let mean = (sum + len / 2) / len;
    Some(u64::try_from(mean).unwrap_or(u64::MAX))
}

/// Average new entity and non-entity clients per month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NewClientAverages {
    pub entity_clients: Option<u64>,
    pub non_entity_clients: Option<u64>,
}

impl NewClientAverages {
    pub fn from_months(months: &[MonthRecord]) -> Self {
        let new_clients: Vec<NewClientsRecord> =
            months.iter().map(|m| m.new_clients.clone()).collect();
        Self {
            entity_clients: calculate_average(&new_clients, ClientType::EntityClients),
            non_entity_clients: calculate_average(&new_clients, ClientType::NonEntityClients),
        }
    }
}

pub const Y_TICK_COUNT: u64 = 5;

/// `Y_TICK_COUNT` evenly spaced integer ticks from the lower to the upper bound.
pub fn y_axis_ticks(bounds: [u64; 2]) -> Vec<u64> {
    let [lower, upper] = bounds;
    let span = u128::from(upper.saturating_sub(lower));
    let intervals = u128::from(Y_TICK_COUNT - 1);
    let mut ticks: Vec<u64> = (0..Y_TICK_COUNT)
        .map(|i| lower + (span * u128::from(i) / intervals) as u64)
        .collect();
    ticks.dedup();
    ticks
}

pub fn y_tick_labels(bounds: [u64; 2]) -> Vec<String> {
    y_axis_ticks(bounds).into_iter().map(format_axis_label).collect()
}

/// Which slice of the month records to chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesSelection {
    pub namespace: Option<String>,
    pub mount: Option<String>,
    pub new_clients: bool,
}

/// One point per month for the selected namespace/mount; months lacking it have no data.
pub fn series_for(months: &[MonthRecord], selection: &SeriesSelection) -> Vec<ChartPoint> {
    months
        .iter()
        .map(|month| {
            let counts = match (&selection.namespace, &selection.mount) {
                (None, _) => Some(if selection.new_clients {
                    &month.new_clients.counts
                } else {
                    &month.counts
                }),
                (Some(ns), None) => month.namespaces_by_key.get(ns).map(|record| {
                    if selection.new_clients {
                        &record.new_clients.counts
                    } else {
                        &record.counts
                    }
                }),
                (Some(ns), Some(mount)) => month
                    .namespaces_by_key
                    .get(ns)
                    .and_then(|record| record.mounts_by_key.get(mount))
                    .map(|record| {
                        if selection.new_clients {
                            &record.new_clients.counts
                        } else {
                            &record.counts
                        }
                    }),
            };
            ChartPoint::new(&month.month, counts.cloned().unwrap_or_default())
        })
        .collect()
}

/// Everything one bar chart renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub legend: Vec<LegendEntry>,
    pub bars: Vec<BarDatum>,
    pub tooltips: Vec<TooltipDatum>,
    pub y_bounds: [u64; 2],
    pub y_ticks: Vec<String>,
    pub x_domain: Vec<String>,
}

impl ChartData {
    pub fn build<D: ChartDatum>(
        legend: &[LegendEntry],
        data: &[D],
        upgrades: &BTreeMap<String, UpgradeEvent>,
    ) -> Self {
        let tooltips = aggregate_tooltips(legend, data, upgrades);
        let y_bounds = y_axis_bounds(&tooltips);
        Self {
            legend: legend.to_vec(),
            bars: bar_dataset(legend, data),
            y_bounds,
            y_ticks: y_tick_labels(y_bounds),
            x_domain: x_axis_domain(data),
            tooltips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ts: &str, clients: Option<u64>, entity: Option<u64>, non_entity: Option<u64>) -> ChartPoint {
        ChartPoint::new(
            ts,
            ClientCounts {
                clients,
                entity_clients: entity,
                non_entity_clients: non_entity,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_no_data_is_not_zero() {
        let legend = [LegendEntry::new(ClientType::Clients, "Total")];
        let data = [point("3/22", None, None, None)];
        assert_eq!(tooltip_legend(&legend, &data[0]), ["No data"]);

        let zero = [point("3/22", Some(0), None, None)];
        assert_eq!(tooltip_legend(&legend, &zero[0]), ["0 Total"]);
    }

    #[test]
    fn test_tooltip_uses_thousands_separators() {
        let legend = default_legend();
        let data = [point("9/21", Some(19251), Some(10713), Some(8538))];
        assert_eq!(
            tooltip_legend(&legend, &data[0]),
            ["10,713 entity clients", "8,538 non-entity clients"]
        );
    }

    #[test]
    fn test_bar_dataset_groups_by_timestamp_first() {
        let legend = default_legend();
        let data = [
            point("1/22", None, Some(3), Some(5)),
            point("2/22", None, Some(4), Some(4)),
        ];
        let bars = bar_dataset(&legend, &data);
        let summary: Vec<_> = bars
            .iter()
            .map(|b| (b.timestamp.as_str(), b.counts, b.client_type))
            .collect();
        assert_eq!(
            summary,
            [
                ("1/22", Some(3), ClientType::EntityClients),
                ("1/22", Some(5), ClientType::NonEntityClients),
                ("2/22", Some(4), ClientType::EntityClients),
                ("2/22", Some(4), ClientType::NonEntityClients),
            ]
        );
    }

    #[test]
    fn test_bar_dataset_collapses_duplicates() {
        let legend = [LegendEntry::new(ClientType::Clients, "Total")];
        let data = [point("1/22", Some(2), None, None), point("1/22", Some(2), None, None)];
        assert_eq!(bar_dataset(&legend, &data).len(), 1);
    }

    #[test]
    fn test_y_bounds_floor() {
        assert_eq!(y_bounds_from_maxima(&[1, 3, 4]), [0, 4]);
        assert_eq!(y_bounds_from_maxima(&[1, 3, 7]), [0, 7]);
        assert_eq!(y_bounds_from_maxima(&[]), [0, 4]);
    }

    #[test]
    fn test_x_domain_keeps_input_order() {
        let data = [
            point("2/22", Some(1), None, None),
            point("1/22", Some(1), None, None),
            point("2/22", Some(1), None, None),
        ];
        assert_eq!(x_axis_domain(&data), ["2/22", "1/22"]);
    }

    #[test]
    fn test_calculate_average() {
        let data = [
            point("1/22", Some(10), None, None),
            point("2/22", None, None, None),
            point("3/22", Some(5), None, None),
        ];
        assert_eq!(calculate_average(&data, ClientType::Clients), Some(5));
        assert_eq!(calculate_average::<ChartPoint>(&[], ClientType::Clients), None);
    }

    #[test]
    fn test_calculate_average_does_not_overflow() {
        let data = [
            point("1/22", Some(u64::MAX), None, None),
            point("2/22", Some(u64::MAX), None, None),
            point("3/22", Some(u64::MAX - 3), None, None),
        ];
        assert_eq!(calculate_average(&data, ClientType::Clients), Some(u64::MAX - 1));
    }

    #[test]
    fn test_y_axis_ticks() {
        assert_eq!(y_axis_ticks([0, 4]), [0, 1, 2, 3, 4]);
        assert_eq!(y_axis_ticks([0, 25]), [0, 6, 12, 18, 25]);
        assert_eq!(y_tick_labels([0, 4_000_000]), ["0", "1M", "2M", "3M", "4M"]);
        assert_eq!(y_tick_labels([0, 6_000]), ["0", "1.5k", "3k", "4.5k", "6k"]);
    }

    #[test]
    fn test_new_client_averages_from_months() {
        let month = |label: &str, entity: u64, non_entity: u64| MonthRecord {
            month: label.to_string(),
            new_clients: NewClientsRecord {
                month: label.to_string(),
                counts: ClientCounts::new(entity + non_entity, entity, non_entity),
            },
            ..Default::default()
        };
        let months = [month("1/22", 3, 5), month("2/22", 4, 4), month("3/22", 2, 0)];
        let averages = NewClientAverages::from_months(&months);
        assert_eq!(averages.entity_clients, Some(3));
        assert_eq!(averages.non_entity_clients, Some(3));
        assert_eq!(NewClientAverages::from_months(&[]), NewClientAverages::default());
    }
}
