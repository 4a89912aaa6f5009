//! Photosnap Ingest - regional Flickr metadata snapshots

use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use photosnap_common::logging::{init_logging, LogConfig, LogLevel};
use photosnap_common::PhotosnapError;
use photosnap_ingest::config::{load_env_file, DEFAULT_ENV_FILE};
use photosnap_ingest::{Cli, Orchestrator};
use std::io::IsTerminal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Credential may live in the dotenv file; load it before clap reads the environment
    load_env_file(DEFAULT_ENV_FILE)?;

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("photosnap-ingest")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    let config = cli.into_config()?;

    let mut orchestrator = Orchestrator::from_config(config)?;
    if std::io::stderr().is_terminal() {
        orchestrator = orchestrator.with_progress(MultiProgress::new());
    }

    let summary = tokio::select! {
        summary = orchestrator.run() => summary?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, snapshots not yet written are left unchanged");
            return Err(PhotosnapError::Cancelled.into());
        },
    };

    for report in &summary.reports {
        for skipped in &report.skipped {
            warn!(region = %report.region, photo_id = %skipped.photo_id, reason = %skipped.reason, "Photo skipped");
        }
    }

    if !summary.is_success() {
        for failure in &summary.failures {
            error!(region = %failure.region, error = %failure.error, "Region failed");
        }
        anyhow::bail!(
            "{} of {} regions failed",
            summary.failures.len(),
            summary.failures.len() + summary.reports.len()
        );
    }

    info!("Ingestion complete");
    Ok(())
}
