//! Newline-delimited JSON decoding for hand-maintained ingest lists
//!
//! Blank lines are tolerated and errors carry the 1-based line number. Snapshots,
//! which this crate writes itself, are read with `serde_jsonlines` instead.

use serde::de::DeserializeOwned;
use std::io::BufRead;
use thiserror::Error;

/// A line that could not be read or decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

/// Decode every non-blank line of `reader` as one `T`.
///
/// Stops at the first failure. Blank lines (including a trailing newline) are skipped.
pub fn decode_lines<T, R>(reader: R) -> Result<Vec<T>, LineError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut values = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| LineError {
            line: line_no,
            reason: e.to_string(),
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let value = serde_json::from_str(&line).map_err(|e| LineError {
            line: line_no,
            reason: e.to_string(),
        })?;
        values.push(value);
    }

    Ok(values)
}
