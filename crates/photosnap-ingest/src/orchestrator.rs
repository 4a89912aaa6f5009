//! Multi-region ingestion orchestrator
//!
//! Discovers regions from the ingest directory and reconciles each one. Regions
//! share nothing but the rate limiter inside the metadata source, so they may run
//! concurrently; a failing region is reported without stopping its siblings.

use crate::config::IngestConfig;
use crate::flickr::{FlickrClient, MetadataSource};
use crate::rate_limit::RateLimiter;
use crate::reconcile::{RegionReconciler, RegionReport};
use crate::snapshot::SnapshotStore;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::MultiProgress;
use photosnap_common::{PhotosnapError, Region, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A region whose run was aborted
#[derive(Debug, Clone, Serialize)]
pub struct RegionFailure {
    pub region: String,
    pub error: String,
}

/// Result of one invocation across all selected regions
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Successful regions, sorted by name
    pub reports: Vec<RegionReport>,
    /// Failed regions, sorted by name
    pub failures: Vec<RegionFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_fetched(&self) -> usize {
        self.reports.iter().map(|r| r.fetched).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.reports.iter().map(|r| r.skipped.len()).sum()
    }
}

/// Every `<name>.ndjson` file directly under `ingest_dir`, sorted by region name
pub fn discover_regions(ingest_dir: &Path) -> Result<Vec<Region>> {
    let entries = std::fs::read_dir(ingest_dir).map_err(|e| {
        PhotosnapError::config(format!(
            "Cannot read ingest directory {}: {}",
            ingest_dir.display(),
            e
        ))
    })?;

    let mut regions = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        match Region::from_ingest_path(&path) {
            Some(region) => regions.push(region),
            None => warn!(path = %path.display(), "Ignoring non-ndjson file in ingest directory"),
        }
    }

    regions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(regions)
}

/// Keep only the regions named in `wanted`; an empty filter keeps everything
pub fn select_regions(regions: Vec<Region>, wanted: &[String]) -> Result<Vec<Region>> {
    if wanted.is_empty() {
        return Ok(regions);
    }

    let unknown: Vec<&str> = wanted
        .iter()
        .filter(|name| !regions.iter().any(|r| &r.name == *name))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(PhotosnapError::config(format!(
            "No ingest list for region(s): {}",
            unknown.join(", ")
        )));
    }

    Ok(regions
        .into_iter()
        .filter(|r| wanted.contains(&r.name))
        .collect())
}

/// Drives a full run over the configured ingest directory
pub struct Orchestrator {
    config: IngestConfig,
    reconciler: RegionReconciler,
}

impl Orchestrator {
    /// Orchestrator backed by the Flickr REST client and a fresh shared limiter
    pub fn from_config(config: IngestConfig) -> Result<Self> {
        let limiter = RateLimiter::new(config.min_call_interval)?;
        let client = FlickrClient::new(&config, limiter)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn new(config: IngestConfig, source: Arc<dyn MetadataSource>) -> Self {
        let reconciler = RegionReconciler::new(source, SnapshotStore::new(&config.output_dir))
            .with_fetch_concurrency(config.fetch_concurrency)
            .with_dry_run(config.dry_run);

        Self { config, reconciler }
    }

    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.reconciler = self.reconciler.with_progress(progress);
        self
    }

    /// Reconcile every selected region
    ///
    /// Errors only for run-level problems (unreadable ingest directory, unknown
    /// region filter, uncreatable output directory). Region failures are
    /// collected in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let regions = select_regions(
            discover_regions(&self.config.ingest_dir)?,
            &self.config.regions,
        )?;

        if !self.config.dry_run {
            std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
                PhotosnapError::persistence(&self.config.output_dir, e.to_string())
            })?;
        }

        info!(
            %run_id,
            regions = regions.len(),
            dry_run = self.config.dry_run,
            "Starting ingest run"
        );

        let outcomes: Vec<(Region, Result<RegionReport>)> = stream::iter(regions)
            .map(|region| async move {
                let outcome = self.reconciler.reconcile(&region).await;
                (region, outcome)
            })
            .buffer_unordered(self.config.region_concurrency.max(1))
            .collect()
            .await;

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (region, outcome) in outcomes {
            match outcome {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!(region = %region, error = %e, "Region failed, previous snapshot kept");
                    failures.push(RegionFailure {
                        region: region.name,
                        error: e.to_string(),
                    });
                },
            }
        }
        reports.sort_by(|a, b| a.region.cmp(&b.region));
        failures.sort_by(|a, b| a.region.cmp(&b.region));

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            reports,
            failures,
        };

        info!(
            %run_id,
            succeeded = summary.reports.len(),
            failed = summary.failures.len(),
            fetched = summary.total_fetched(),
            skipped = summary.total_skipped(),
            "Ingest run finished"
        );
        Ok(summary)
    }
}
