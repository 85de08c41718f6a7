//! Usage Analysis Engine
//!
//! This module ties the pipeline together for callers that start from files rather than
//! in-memory payloads. It serves as the entry point for the CLI.
//!
//! ## Core Functionality
//!
//! The [`ClientUsageAnalyzer`] coordinates:
//!
//! 1. **Loading**: reads the activity payload and the version history from JSON files
//! 2. **Aggregation**: builds sorted [`MonthRecord`]s via [`aggregate_by_month`]
//! 3. **Annotation**: selects noteworthy upgrades in the activity window and indexes them
//! 4. **Reporting**: hands an [`ActivityReport`] to the [`DisplayManager`], or builds
//!    [`ChartData`] for one series
//!
//! ## Usage Example
//!
//! ```rust
//! use client_usage::analyzer::ClientUsageAnalyzer;
//! use client_usage::models::ActivityResponse;
//!
//! let response = ActivityResponse::from_json_str(r#"[
//!     {"timestamp": "2022-03-01T00:00:00Z",
//!      "counts": {"clients": 10, "distinct_entities": 6, "non_entity_tokens": 4},
//!      "namespaces": []}
//! ]"#).unwrap();
//!
//! let report = ClientUsageAnalyzer::new().analyze(&response, &[]);
//! assert_eq!(report.months[0].month, "3/22");
//! ```

use crate::aggregator::aggregate_by_month;
use crate::chart::{default_legend, series_for, ChartData, NewClientAverages, SeriesSelection};
use crate::display::DisplayManager;
use crate::models::{ActivityResponse, MonthRecord, UpgradeEvent};
use crate::normalize::{flatten, ClientCounts};
use crate::reshape::{reshape_namespaces, LabeledNamespace};
use crate::upgrades::{filter_version_history, index_upgrades_by_month, upgrade_message};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options shared by the report commands.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub activity_path: PathBuf,
    pub versions_path: Option<PathBuf>,
    pub json_output: bool,
    pub limit: Option<usize>,
    pub selection: SeriesSelection,
}

/// Aggregated activity plus the upgrades that fall inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub total: ClientCounts,
    pub by_namespace: Vec<LabeledNamespace>,
    pub months: Vec<MonthRecord>,
    pub average_new_clients: NewClientAverages,
    pub upgrades: Vec<UpgradeEvent>,
    #[serde(skip)]
    pub upgrades_by_month: BTreeMap<String, UpgradeEvent>,
}

impl ActivityReport {
    pub fn upgrade_message(&self, month: &str) -> Option<String> {
        upgrade_message(&self.upgrades_by_month, month)
    }

    /// Keep only the most recent `limit` months; the new-client averages follow.
    pub fn truncate_to_recent(&mut self, limit: usize) {
        if self.months.len() > limit {
            self.months.drain(..self.months.len() - limit);
            self.average_new_clients = NewClientAverages::from_months(&self.months);
        }
    }
}

pub struct ClientUsageAnalyzer {
    display_manager: DisplayManager,
}

impl Default for ClientUsageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientUsageAnalyzer {
    pub fn new() -> Self {
        Self {
            display_manager: DisplayManager::new(),
        }
    }

    pub fn load_activity(path: &Path) -> Result<ActivityResponse> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read activity file: {}", path.display()))?;
        ActivityResponse::from_json_str(&content)
            .with_context(|| format!("Failed to decode activity file: {}", path.display()))
    }

    pub fn load_version_history(path: &Path) -> Result<Vec<UpgradeEvent>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read version history: {}", path.display()))?;
        UpgradeEvent::list_from_json_str(&content)
            .with_context(|| format!("Failed to decode version history: {}", path.display()))
    }

    /// Aggregate a decoded payload and annotate it with version history.
    ///
    /// With an activity window, only noteworthy upgrades inside it are kept; a bare
    /// months array has no window, so every upgrade is indexed.
    pub fn analyze(&self, response: &ActivityResponse, history: &[UpgradeEvent]) -> ActivityReport {
        let months = aggregate_by_month(response.months());

        let upgrades = match (&response.start_time, &response.end_time) {
            (Some(start), Some(end)) => filter_version_history(history, start, end),
            _ => history.to_vec(),
        };

        info!(
            months = months.len(),
            upgrades = upgrades.len(),
            "Aggregated client activity"
        );

        ActivityReport {
            start_time: response.start_time.clone(),
            end_time: response.end_time.clone(),
            total: flatten(response),
            by_namespace: reshape_namespaces(response.by_namespace.as_deref().unwrap_or_default()),
            upgrades_by_month: index_upgrades_by_month(&upgrades),
            upgrades,
            average_new_clients: NewClientAverages::from_months(&months),
            months,
        }
    }

    fn build_report(&self, options: &ReportOptions) -> Result<ActivityReport> {
        let response = Self::load_activity(&options.activity_path)?;
        let history = match &options.versions_path {
            Some(path) => Self::load_version_history(path)?,
            None => Vec::new(),
        };
        Ok(self.analyze(&response, &history))
    }

    /// Chart bundle for the selected series of a report.
    pub fn chart(&self, report: &ActivityReport, selection: &SeriesSelection) -> ChartData {
        let series = series_for(&report.months, selection);
        ChartData::build(&default_legend(), &series, &report.upgrades_by_month)
    }

    pub fn run_command(&self, command: &str, options: &ReportOptions) -> Result<()> {
        let mut report = self.build_report(options)?;

        if let Some(limit) = options.limit {
            report.truncate_to_recent(limit);
        }

        if report.months.is_empty() {
            warn!(path = %options.activity_path.display(), "No monthly activity found");
        }

        match command {
            "monthly" => self.display_manager.display_monthly(&report, options.json_output),
            "chart" => {
                let chart = self.chart(&report, &options.selection);
                self.display_manager.display_chart(&chart)?;
            }
            _ => {
                anyhow::bail!("Unknown command: {}", command);
            }
        }

        Ok(())
    }
}
