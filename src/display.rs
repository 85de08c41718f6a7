//! Output Formatting and Display Management
//!
//! Renders an [`ActivityReport`] either as a colored terminal report or as JSON.
//!
//! ## Monthly Report
//!
//! A header with the month count, overall totals and the average new entity and
//! non-entity clients per month, then one block per month, oldest first:
//! - month label with total, entity and non-entity clients
//! - clients first seen that month
//! - an upgrade note when a noteworthy upgrade landed that month
//! - per-namespace totals, largest first, with their mounts indented below
//!
//! Months the backend has no summary for are not in the report at all.
//!
//! ## JSON Output
//!
//! `{"monthly": <report>}` where the report carries `months` with `namespaces_by_key` and
//! `new_clients` at every level. Pretty-printing follows `output.json_pretty`.
//!
//! ## Charts
//!
//! [`DisplayManager::display_chart`] always prints JSON; chart data is meant for a
//! renderer, not a terminal.

use crate::analyzer::ActivityReport;
use crate::chart::{ChartData, NewClientAverages};
use crate::config::get_config;
use crate::format::format_number;
use crate::models::{MonthRecord, NamespaceRecord};
use crate::normalize::ClientCounts;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

pub struct DisplayManager;

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

fn count_or_dash(value: Option<u64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

fn counts_summary(counts: &ClientCounts) -> String {
    format!(
        "{} clients ({} entity, {} non-entity)",
        count_or_dash(counts.clients),
        count_or_dash(counts.entity_clients),
        count_or_dash(counts.non_entity_clients)
    )
}

fn averages_summary(averages: &NewClientAverages) -> String {
    format!(
        "{} entity, {} non-entity",
        count_or_dash(averages.entity_clients),
        count_or_dash(averages.non_entity_clients)
    )
}

/// Namespaces ordered by total clients, largest first, ties by label.
fn namespaces_by_size(month: &MonthRecord) -> Vec<(&String, &NamespaceRecord)> {
    let mut namespaces: Vec<_> = month.namespaces_by_key.iter().collect();
    namespaces.sort_by(|a, b| {
        b.1.counts
            .clients
            .cmp(&a.1.counts.clients)
            .then_with(|| a.0.cmp(b.0))
    });
    namespaces
}

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize>(value: &T) -> Result<String> {
        let rendered = if get_config().output.json_pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.context("Failed to serialize output to JSON")
    }

    pub fn display_monthly(&self, report: &ActivityReport, json_output: bool) {
        if json_output {
            let output = serde_json::json!({ "monthly": report });
            match Self::to_json(&output) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Error serializing monthly data to JSON: {:#}", e),
            }
            return;
        }

        if !get_config().output.color {
            colored::control::set_override(false);
        }

        println!("\n{}", "=".repeat(80).bright_cyan());
        println!(
            "{}",
            "Client Usage Report - Monthly with Namespace Breakdown"
                .bright_white()
                .bold()
        );
        println!("{}", "=".repeat(80).bright_cyan());

        let range = match (&report.start_time, &report.end_time) {
            (Some(start), Some(end)) => format!("{} → {}", start, end),
            _ => "all months".to_string(),
        };
        println!(
            "\n{} {} months • {} • {}\n",
            "📊".bright_yellow(),
            report.months.len().to_string().bright_white().bold(),
            counts_summary(&report.total).bright_green().bold(),
            range.bright_white()
        );

        println!(
            "{} {}\n",
            "Average new clients per month:".bright_yellow(),
            averages_summary(&report.average_new_clients)
        );

        for month in &report.months {
            self.print_month(report, month);
        }
    }

    fn print_month(&self, report: &ActivityReport, month: &MonthRecord) {
        println!(
            "{} {}: {}",
            "📅".bright_blue(),
            month.month.bright_white().bold(),
            counts_summary(&month.counts).bright_green()
        );
        println!(
            "   {} {}",
            "new:".bright_yellow(),
            counts_summary(&month.new_clients.counts)
        );
        if let Some(message) = report.upgrade_message(&month.month) {
            println!("   {} {}", "⬆".bright_magenta(), message.bright_magenta());
        }

        for (label, namespace) in namespaces_by_size(month) {
            let percentage = match (namespace.counts.clients, month.counts.clients) {
                (Some(part), Some(whole)) if whole > 0 => part as f64 / whole as f64 * 100.0,
                _ => 0.0,
            };
            println!(
                "   {}: {} ({}%, {} new)",
                label.bright_cyan(),
                count_or_dash(namespace.counts.clients).bright_green(),
                format!("{:.0}", percentage).bright_yellow(),
                count_or_dash(namespace.new_clients.counts.clients).bright_white()
            );
            for (mount_label, mount) in &namespace.mounts_by_key {
                println!(
                    "      {} {}",
                    mount_label.cyan(),
                    counts_summary(&mount.counts)
                );
            }
        }

        println!();
    }

    pub fn display_chart(&self, chart: &ChartData) -> Result<()> {
        println!("{}", Self::to_json(chart)?);
        Ok(())
    }
}
