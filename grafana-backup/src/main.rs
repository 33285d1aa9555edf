//! Grafana Dashboard Backup - Main entry point
//!
//! Fetches dashboards from one or more Grafana hosts and stores them as
//! JSON files, optionally archived into a dated tarball.

use anyhow::Result;
use clap::Parser;
use grafana_backup::{config::Config, executor::BackupType, orchestrator, utils};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Kind of backup to take
    #[arg(long, value_enum, default_value_t = BackupType::Daily)]
    backup_type: BackupType,

    /// Backup directory name for the host (single-host mode, defaults to the
    /// local hostname)
    #[arg(short, long)]
    name: Option<String>,

    /// Grafana base URL (single-host mode)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to the JSON configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)?;

    let log_level = args.log_level.as_deref().unwrap_or("info");
    utils::logger::init(log_level)?;

    tracing::info!(
        "Starting grafana-backup v{} ({} backup)",
        env!("CARGO_PKG_VERSION"),
        args.backup_type
    );

    let hosts = config.hosts(args.name.as_deref(), args.url.as_deref())?;
    orchestrator::run(&config, hosts, args.backup_type).await?;

    tracing::info!("Completed taking Grafana JSON backup");

    Ok(())
}
