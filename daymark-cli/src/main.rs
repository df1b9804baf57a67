mod commands;
mod config;
mod render;
mod utils;

use std::io::IsTerminal;

use anyhow::{Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use daymark_core::MonthKey;
use tracing_subscriber::EnvFilter;

use crate::config::DaymarkConfig;

#[derive(Parser)]
#[command(name = "daymark")]
#[command(about = "See which days your dashboard has data for, month by month")]
struct Cli {
    /// Dashboard server URL (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the month grid with per-source badges
    Show {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<MonthKey>,
    },
    /// Print ingestion progress and day counts for a month
    Status {
        /// Month to check (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<MonthKey>,
    },
    /// Keep the month grid live while sources ingest
    Watch {
        /// Month to start on (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<MonthKey>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = DaymarkConfig::load()?;
    let settings = config.sync_settings(cli.server.as_deref())?;
    let current = || MonthKey::from_date(commands::today());

    match cli.command {
        Commands::Show { month } => commands::show::run(settings, month.unwrap_or_else(current)).await,
        Commands::Status { month } => {
            commands::status::run(settings, month.unwrap_or_else(current)).await
        }
        Commands::Watch { month } => {
            commands::watch::run(settings, month.unwrap_or_else(current)).await
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        tracing::debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
