//! RegionWatch CLI - Command-line interface
//!
//! Ingests asset position reports and queries tracks, regions and crossing
//! history through the regionwatch library.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use regionwatch::config::config_file_path;
use regionwatch::store::LockMode;

use commands::common::CliContext;
use commands::config::ConfigCommands;
use commands::ingest::IngestArgs;
use commands::query::{CrossingsArgs, PositionsArgs, TrackArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "regionwatch")]
#[command(version, about = "Detect asset entries into and exits from geographic regions", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.regionwatch/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest newline-delimited JSON position reports
    Ingest(IngestArgs),

    /// Query stored position reports
    Positions(PositionsArgs),

    /// Show an asset's track as a GeoJSON LineString
    Track(TrackArgs),

    /// List the region catalog
    Regions,

    /// Query region crossing history
    Crossings(CrossingsArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config_file_path);

    if let Err(e) = run(cli.command, config_path).await {
        e.exit();
    }
}

async fn run(command: Commands, config_path: PathBuf) -> Result<(), CliError> {
    if let Commands::Config(command) = command {
        return commands::config::run(command, &config_path);
    }

    let mode = match command {
        Commands::Ingest(_) => LockMode::Exclusive,
        _ => LockMode::Shared,
    };
    let ctx = CliContext::load(&config_path, mode)?;
    match command {
        Commands::Ingest(args) => commands::ingest::run(&ctx, args).await,
        Commands::Positions(args) => commands::query::run_positions(&ctx, args),
        Commands::Track(args) => commands::query::run_track(&ctx, args),
        Commands::Regions => commands::query::run_regions(&ctx),
        Commands::Crossings(args) => commands::query::run_crossings(&ctx, args),
        Commands::Config(_) => Ok(()),
    }
}
