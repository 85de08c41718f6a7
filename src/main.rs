use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client_usage::analyzer::{ClientUsageAnalyzer, ReportOptions};
use client_usage::chart::SeriesSelection;
use client_usage::config::get_config;
use client_usage::logging::init_logging;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "client-usage")]
#[command(about = "Client-count usage analytics for Vault activity exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Activity payload (JSON envelope or array of months)
    #[arg(long)]
    activity: PathBuf,
    /// Version history (JSON array of upgrades)
    #[arg(long)]
    versions: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show monthly usage with namespace breakdown
    Monthly {
        #[command(flatten)]
        source: SourceArgs,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Show only the last N months
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print chart data (bars, tooltips, axis bounds) as JSON
    Chart {
        #[command(flatten)]
        source: SourceArgs,
        /// Chart a single namespace
        #[arg(long)]
        namespace: Option<String>,
        /// Chart a single mount within --namespace
        #[arg(long, requires = "namespace")]
        mount: Option<String>,
        /// Chart new clients instead of totals
        #[arg(long = "new")]
        new_clients: bool,
        /// Show only the last N months
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = get_config();
    let _guard = init_logging(&config.logging, &config.paths.log_directory);

    let analyzer = ClientUsageAnalyzer::new();

    let (command, options) = match cli.command {
        Commands::Monthly {
            source,
            json,
            limit,
        } => (
            "monthly",
            ReportOptions {
                activity_path: source.activity,
                versions_path: source.versions,
                json_output: json,
                limit: limit.or(config.output.month_limit),
                selection: SeriesSelection::default(),
            },
        ),
        Commands::Chart {
            source,
            namespace,
            mount,
            new_clients,
            limit,
        } => (
            "chart",
            ReportOptions {
                activity_path: source.activity,
                versions_path: source.versions,
                json_output: true,
                limit: limit.or(config.output.month_limit),
                selection: SeriesSelection {
                    namespace,
                    mount,
                    new_clients,
                },
            },
        ),
    };

    match analyzer.run_command(command, &options) {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, options.json_output),
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
