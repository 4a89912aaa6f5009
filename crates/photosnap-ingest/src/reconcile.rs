//! Region reconciliation
//!
//! Brings one region's snapshot in line with its id list:
//!
//! 1. load the id list and drop repeated ids
//! 2. load the existing snapshot
//! 3. split ids into hits (already persisted) and misses
//! 4. fetch and transform every miss
//! 5. merge in id-list order and replace the snapshot
//!
//! Persisted records are carried forward verbatim and never re-fetched. Nothing is
//! written until every miss has resolved, so a failed run leaves the previous
//! snapshot as it was.

use crate::flickr::MetadataSource;
use crate::ids::{dedup_preserving_order, load_ids};
use crate::snapshot::SnapshotStore;
use crate::transform::transform;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use photosnap_common::{Entry, PhotosnapError, Region, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// A photo left out of the snapshot because the service rejected it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPhoto {
    pub photo_id: String,
    pub reason: String,
}

/// Outcome of reconciling one region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionReport {
    pub region: String,
    /// Ids in the ingest list, duplicates included
    pub listed: usize,
    pub duplicates: usize,
    pub hits: usize,
    pub misses: usize,
    /// Misses successfully fetched and transformed
    pub fetched: usize,
    pub skipped: Vec<SkippedPhoto>,
    /// Records in the written snapshot
    pub written: usize,
    /// False for dry runs
    pub persisted: bool,
}

/// An id's place in the merged snapshot, before fetching
enum Slot {
    Hit(Entry),
    Miss(String),
}

/// An id's place in the merged snapshot, after fetching
enum Resolved {
    Kept(Entry),
    Fetched(Entry),
    Skipped(SkippedPhoto),
}

/// Reconciles regions against a metadata source and a snapshot store
pub struct RegionReconciler {
    source: Arc<dyn MetadataSource>,
    store: SnapshotStore,
    fetch_concurrency: usize,
    dry_run: bool,
    progress: Option<MultiProgress>,
}

impl RegionReconciler {
    pub fn new(source: Arc<dyn MetadataSource>, store: SnapshotStore) -> Self {
        Self {
            source,
            store,
            fetch_concurrency: 1,
            dry_run: false,
            progress: None,
        }
    }

    /// Fetch up to `n` missing photos at once (the rate limiter still spaces calls)
    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }

    /// Stop after the diff: no remote calls, no write
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Draw a per-region progress bar while fetching
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Reconcile one region and replace its snapshot
    pub async fn reconcile(&self, region: &Region) -> Result<RegionReport> {
        let span = info_span!("region", region = %region.name);
        self.reconcile_inner(region).instrument(span).await
    }

    async fn reconcile_inner(&self, region: &Region) -> Result<RegionReport> {
        let listed = load_ids(&region.ingest_path)?;
        let listed_count = listed.len();
        let (ids, duplicates) = dedup_preserving_order(listed);
        if duplicates > 0 {
            warn!(duplicates, "Ingest list repeats ids, keeping first occurrences");
        }

        let mut existing = self.store.read(region)?;

        let slots: Vec<Slot> = ids
            .into_iter()
            .map(|id| match existing.remove(&id) {
                Some(entry) => Slot::Hit(entry),
                None => Slot::Miss(id),
            })
            .collect();
        let misses = slots.iter().filter(|slot| matches!(slot, Slot::Miss(_))).count();
        let hits = slots.len() - misses;

        let mut report = RegionReport {
            region: region.name.clone(),
            listed: listed_count,
            duplicates,
            hits,
            misses,
            ..Default::default()
        };

        info!(ids = slots.len(), hits, misses, "Diffed ingest list against snapshot");

        if self.dry_run {
            return Ok(report);
        }

        let bar = self.progress_bar(region, misses);
        let resolved = self.resolve(slots, &bar).await?;

        let mut merged = Vec::with_capacity(resolved.len());
        for outcome in resolved {
            match outcome {
                Resolved::Kept(entry) => merged.push(entry),
                Resolved::Fetched(entry) => {
                    report.fetched += 1;
                    merged.push(entry);
                },
                Resolved::Skipped(skipped) => report.skipped.push(skipped),
            }
        }

        self.store.write(region, &merged)?;
        report.written = merged.len();
        report.persisted = true;

        info!(
            written = report.written,
            fetched = report.fetched,
            skipped = report.skipped.len(),
            "Region reconciled"
        );
        Ok(report)
    }

    /// Fetch every miss while keeping slot order, or fail on the first error that
    /// is not per-photo. `bar` is cleared either way.
    async fn resolve(&self, slots: Vec<Slot>, bar: &ProgressBar) -> Result<Vec<Resolved>> {
        let resolved: Result<Vec<Resolved>> = stream::iter(slots)
            .map(|slot| async move {
                match slot {
                    Slot::Hit(entry) => Ok(Resolved::Kept(entry)),
                    Slot::Miss(id) => {
                        let outcome = self.fetch_one(&id).await;
                        bar.inc(1);
                        outcome
                    },
                }
            })
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await;

        bar.finish_and_clear();
        resolved
    }

    async fn fetch_one(&self, photo_id: &str) -> Result<Resolved> {
        debug!(photo_id, "Fetching photo metadata");

        let fetched = async {
            let info = self.source.fetch_info(photo_id).await?;
            let sizes = self.source.fetch_sizes(photo_id).await?;
            Ok::<_, PhotosnapError>(transform(photo_id, &info, sizes))
        }
        .await;

        match fetched {
            Ok(entry) => Ok(Resolved::Fetched(entry)),
            Err(e) if e.is_skippable() => {
                warn!(photo_id, error = %e, "Skipping photo");
                Ok(Resolved::Skipped(SkippedPhoto {
                    photo_id: photo_id.to_string(),
                    reason: e.to_string(),
                }))
            },
            Err(e) => Err(e),
        }
    }

    fn progress_bar(&self, region: &Region, len: usize) -> ProgressBar {
        let Some(multi) = self.progress.as_ref().filter(|_| len > 0) else {
            return ProgressBar::hidden();
        };

        let bar = multi.add(ProgressBar::new(len as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{prefix:>12} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_prefix(region.name.clone());
        bar
    }
}
