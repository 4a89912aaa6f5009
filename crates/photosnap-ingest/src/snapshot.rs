//! Region snapshots
//!
//! A snapshot is `{output_dir}/{region}.ndjson`, one [`Entry`] per line in ingest
//! order. Writes go to a temporary file in the same directory which is then
//! renamed over the old snapshot, so readers see either the previous snapshot or
//! the complete new one.

use photosnap_common::{Entry, PhotosnapError, Region, Result};
use serde_jsonlines::{JsonLinesReader, JsonLinesWriter};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Reads and replaces region snapshots under one output directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    output_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the snapshot for `region` within this store
    pub fn snapshot_path(&self, region: &Region) -> PathBuf {
        self.output_dir.join(region.file_name())
    }

    /// Load the existing records for `region`, keyed by photo id.
    ///
    /// No snapshot yet means an empty map. An unreadable file or a line that does
    /// not decode as an [`Entry`] is an error; corrupt snapshots are never repaired.
    pub fn read(&self, region: &Region) -> Result<HashMap<String, Entry>> {
        let path = self.snapshot_path(region);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(region = %region, "No existing snapshot");
                return Ok(HashMap::new());
            },
            Err(e) => return Err(PhotosnapError::persistence(&path, e.to_string())),
        };

        let mut by_id = HashMap::new();
        let records = JsonLinesReader::new(BufReader::new(file)).read_all::<Entry>();
        for (index, record) in records.enumerate() {
            let entry = record.map_err(|e| {
                PhotosnapError::persistence(&path, format!("line {}: {}", index + 1, e))
            })?;
            if let Some(previous) = by_id.insert(entry.id.clone(), entry) {
                warn!(region = %region, photo_id = %previous.id, "Duplicate id in snapshot, keeping last");
            }
        }

        debug!(region = %region, records = by_id.len(), "Loaded snapshot");
        Ok(by_id)
    }

    /// Replace the snapshot for `region` with `entries`, in the given order.
    ///
    /// On error the previous snapshot, if any, is left untouched.
    pub fn write(&self, region: &Region, entries: &[Entry]) -> Result<()> {
        let path = self.snapshot_path(region);
        let staged = self
            .stage(entries)
            .map_err(|e| PhotosnapError::persistence(&path, e.to_string()))?;

        staged
            .persist(&path)
            .map_err(|e| PhotosnapError::persistence(&path, e.error.to_string()))?;

        info!(region = %region, records = entries.len(), path = %path.display(), "Snapshot written");
        Ok(())
    }

    fn stage(&self, entries: &[Entry]) -> std::io::Result<NamedTempFile> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut staged = NamedTempFile::new_in(&self.output_dir)?;
        {
            let mut writer = JsonLinesWriter::new(BufWriter::new(staged.as_file_mut()));
            for entry in entries {
                writer.write(entry)?;
            }
            writer.flush()?;
        }
        staged.as_file().sync_all()?;

        Ok(staged)
    }
}
