//! Region id lists
//!
//! An ingest file holds one JSON string per line, each a photo id. The file name
//! without its `.ndjson` suffix is the region name.

use crate::ndjson::decode_lines;
use photosnap_common::{PhotosnapError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Read the ordered id list for a region.
///
/// Ids are returned exactly as listed, duplicates included. A missing file or a
/// line that is not a JSON string is a configuration error.
pub fn load_ids(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| {
        PhotosnapError::config(format!("Cannot open ingest list {}: {}", path.display(), e))
    })?;

    let ids: Vec<String> =
        decode_lines(BufReader::new(file)).map_err(|e| PhotosnapError::Ingest {
            path: path.to_path_buf(),
            line: e.line,
            reason: e.reason,
        })?;

    debug!(path = %path.display(), count = ids.len(), "Loaded ingest list");
    Ok(ids)
}

/// Drop repeated ids, keeping the first occurrence of each.
///
/// Returns the unique ids in their original order and how many were dropped.
pub fn dedup_preserving_order(ids: Vec<String>) -> (Vec<String>, usize) {
    let total = ids.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
    let dropped = total - unique.len();
    (unique, dropped)
}
