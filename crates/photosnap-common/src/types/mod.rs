//! Domain types shared across Photosnap
//!
//! [`Entry`] is the flat record persisted in a region snapshot, one JSON object per
//! line. Field names on the wire are camelCase, except the webpage which is stored
//! as `url`.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// One rendition of a photo as reported by the photo service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureSize {
    /// Semantic size name ("Square", "Medium 640", "Original", ...)
    pub label: String,

    #[serde(deserialize_with = "number_or_string")]
    pub width: u32,

    #[serde(deserialize_with = "number_or_string")]
    pub height: u32,

    /// Direct image URL
    pub source: String,
}

/// Normalized metadata for a single photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,

    #[serde(default)]
    pub sizes: Vec<PictureSize>,

    #[serde(default)]
    pub owner_username: String,

    #[serde(default)]
    pub owner_icon: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Capture timestamp exactly as the service formats it
    #[serde(default)]
    pub date_taken: String,

    #[serde(default)]
    pub latitude: String,

    #[serde(default)]
    pub longitude: String,

    #[serde(default)]
    pub location_accuracy: String,

    /// Non-empty place names, most specific first, joined with ", "
    #[serde(default)]
    pub location_description: String,

    #[serde(rename = "url", default)]
    pub webpage: String,
}

/// A named partition of work: one ingest file and one snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub name: String,
    pub ingest_path: PathBuf,
}

impl Region {
    /// File suffix shared by ingest lists and snapshots
    pub const EXTENSION: &'static str = "ndjson";

    pub fn new(name: impl Into<String>, ingest_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            ingest_path: ingest_path.into(),
        }
    }

    /// Region for an ingest file, named after the file stem.
    ///
    /// Returns `None` unless the file carries the `.ndjson` suffix.
    pub fn from_ingest_path(path: &Path) -> Option<Self> {
        if path.extension()? != Self::EXTENSION {
            return None;
        }
        let name = path.file_stem()?.to_str()?;
        Some(Self::new(name, path))
    }

    /// `<name>.ndjson`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, Self::EXTENSION)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// The service is inconsistent about dimensions: "width": 75 and "width": "75" both occur.
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Dimension {
        Number(u32),
        Text(String),
    }

    match Dimension::deserialize(deserializer)? {
        Dimension::Number(n) => Ok(n),
        Dimension::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_size_accepts_string_dimensions() {
        let size: PictureSize = serde_json::from_str(
            r#"{"label":"Square","width":"75","height":75,"source":"https://live.staticflickr.com/1/2_s.jpg"}"#,
        )
        .unwrap();
        assert_eq!(size.width, 75);
        assert_eq!(size.height, 75);
    }

    #[test]
    fn test_picture_size_rejects_garbage_dimensions() {
        let result = serde_json::from_str::<PictureSize>(
            r#"{"label":"Square","width":"wide","height":75,"source":"x"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_entry_wire_field_names() {
        let entry = Entry {
            id: "42".to_string(),
            sizes: vec![],
            owner_username: "alice".to_string(),
            owner_icon: "icon".to_string(),
            title: "t".to_string(),
            description: String::new(),
            date_taken: "2020-01-01 10:00:00".to_string(),
            latitude: "40.7".to_string(),
            longitude: "-73.9".to_string(),
            location_accuracy: "16".to_string(),
            location_description: "Brooklyn".to_string(),
            webpage: "https://flickr.com/photos/x/42".to_string(),
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["ownerUsername"], "alice");
        assert_eq!(value["dateTaken"], "2020-01-01 10:00:00");
        assert_eq!(value["locationAccuracy"], "16");
        assert_eq!(value["locationDescription"], "Brooklyn");
        assert_eq!(value["url"], "https://flickr.com/photos/x/42");
        assert!(value.get("webpage").is_none());
    }

    #[test]
    fn test_region_from_ingest_path() {
        let region = Region::from_ingest_path(Path::new("ingest/nyc.ndjson")).unwrap();
        assert_eq!(region.name, "nyc");
        assert_eq!(region.ingest_path, PathBuf::from("ingest/nyc.ndjson"));
        assert_eq!(region.file_name(), "nyc.ndjson");
        assert_eq!(region.to_string(), "nyc");

        assert!(Region::from_ingest_path(Path::new("ingest/README.md")).is_none());
        assert!(Region::from_ingest_path(Path::new("ingest/nyc")).is_none());
    }
}
