//! Raw Flickr REST payloads
//!
//! Only the fields the transformer reads are modeled. Anything the service omits
//! decodes to its empty default; the wrapping `photo` / `sizes` objects are required.

use photosnap_common::PictureSize;
use serde::{Deserialize, Deserializer};

/// Response envelope status, present on every reply
#[derive(Debug, Deserialize)]
pub(crate) struct Status {
    #[serde(default)]
    pub stat: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `flickr.photos.getInfo`
#[derive(Debug, Clone, Deserialize)]
pub struct InfoResponse {
    pub photo: PhotoInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoInfo {
    pub owner: Owner,
    pub title: Content,
    pub description: Content,
    pub dates: Dates,
    pub location: Location,
    pub urls: Urls,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Owner {
    pub nsid: String,
    pub username: String,
    #[serde(deserialize_with = "string_or_number")]
    pub iconserver: String,
    #[serde(deserialize_with = "string_or_number")]
    pub iconfarm: String,
}

/// Flickr wraps free text as `{"_content": "..."}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Content {
    #[serde(rename = "_content", deserialize_with = "string_or_number")]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dates {
    pub taken: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    #[serde(deserialize_with = "string_or_number")]
    pub accuracy: String,
    #[serde(alias = "neighborhood")]
    pub neighbourhood: Content,
    pub locality: Content,
    pub county: Content,
    pub region: Content,
    pub country: Content,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Urls {
    pub url: Vec<PhotoUrl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoUrl {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "_content")]
    pub content: String,
}

/// `flickr.photos.getSizes`
#[derive(Debug, Clone, Deserialize)]
pub struct SizesResponse {
    pub sizes: PhotoSizes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoSizes {
    pub size: Vec<PictureSize>,
}

// Coordinates, accuracy and icon farm show up as either JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
        Null,
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Number(n) => n.to_string(),
        Scalar::Null => String::new(),
    })
}
