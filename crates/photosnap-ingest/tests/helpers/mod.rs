//! Shared fixtures for ingest integration tests
//!
//! A [`MockServer`] stands in for the Flickr REST endpoint. Payloads mirror the
//! shape of real `getInfo` / `getSizes` replies.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use photosnap_common::Entry;
use photosnap_ingest::config::IngestConfig;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockBuilder, MockServer, ResponseTemplate,
};

pub const API_KEY: &str = "test-api-key";
pub const REST_PATH: &str = "/services/rest";

/// Scratch ingest/output directories for one test
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("ingest")).unwrap();
        Self { dir }
    }

    pub fn ingest_dir(&self) -> PathBuf {
        self.dir.path().join("ingest")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn snapshot_path(&self, region: &str) -> PathBuf {
        self.output_dir().join(format!("{}.ndjson", region))
    }

    /// Write `ids` as the ingest list for `region`
    pub fn ingest(&self, region: &str, ids: &[&str]) {
        let body: String = ids.iter().map(|id| format!("\"{}\"\n", id)).collect();
        std::fs::write(self.ingest_dir().join(format!("{}.ndjson", region)), body).unwrap();
    }

    pub fn snapshot_bytes(&self, region: &str) -> Vec<u8> {
        std::fs::read(self.snapshot_path(region)).unwrap()
    }

    pub fn snapshot(&self, region: &str) -> Vec<Entry> {
        read_entries(&self.snapshot_path(region))
    }

    pub fn snapshot_ids(&self, region: &str) -> Vec<String> {
        self.snapshot(region).into_iter().map(|e| e.id).collect()
    }

    /// Fast-paced configuration pointed at the mock server
    pub fn config(&self, server: &MockServer) -> IngestConfig {
        let mut config = IngestConfig::new(API_KEY);
        config.endpoint = format!("{}{}", server.uri(), REST_PATH);
        config.ingest_dir = self.ingest_dir();
        config.output_dir = self.output_dir();
        config.min_call_interval = Duration::from_millis(1);
        config.request_timeout = Duration::from_secs(5);
        config.retry_delay = Duration::from_millis(5);
        config
    }
}

pub fn read_entries(path: &Path) -> Vec<Entry> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

pub fn info_payload(photo_id: &str) -> Value {
    json!({
        "photo": {
            "id": photo_id,
            "owner": {
                "nsid": "12345@N00",
                "username": "bridgewalker",
                "iconserver": "7372",
                "iconfarm": 8
            },
            "title": {"_content": format!("Photo {}", photo_id)},
            "description": {"_content": "Taken from the promenade"},
            "dates": {"taken": "2019-06-01 20:41:07"},
            "location": {
                "latitude": "40.706",
                "longitude": "-73.996",
                "accuracy": "16",
                "neighbourhood": {"_content": ""},
                "locality": {"_content": "Brooklyn"},
                "county": {"_content": ""},
                "region": {"_content": "NY"},
                "country": {"_content": "USA"}
            },
            "urls": {
                "url": [{
                    "type": "photopage",
                    "_content": format!("https://www.flickr.com/photos/bridgewalker/{}/", photo_id)
                }]
            }
        },
        "stat": "ok"
    })
}

pub fn sizes_payload(photo_id: &str) -> Value {
    json!({
        "sizes": {
            "canblog": 0,
            "size": [
                {
                    "label": "Square",
                    "width": 75,
                    "height": 75,
                    "source": format!("https://live.staticflickr.com/65535/{}_s.jpg", photo_id)
                },
                {
                    "label": "Large",
                    "width": "1024",
                    "height": "683",
                    "source": format!("https://live.staticflickr.com/65535/{}_b.jpg", photo_id)
                }
            ]
        },
        "stat": "ok"
    })
}

pub fn not_found_payload() -> Value {
    json!({"stat": "fail", "code": 1, "message": "Photo \"0\" not found (invalid ID)"})
}

pub fn invalid_key_payload() -> Value {
    json!({"stat": "fail", "code": 100, "message": "Invalid API Key (Key has invalid format)"})
}

/// GET to the REST path for `flickr_method` and `photo_id`
pub fn call(flickr_method: &str, photo_id: &str) -> MockBuilder {
    Mock::given(method("GET"))
        .and(path(REST_PATH))
        .and(query_param("method", flickr_method))
        .and(query_param("photo_id", photo_id))
}

/// Serve well-formed getInfo and getSizes replies for every id in `ids`
pub async fn mount_photos(server: &MockServer, ids: &[&str]) {
    for id in ids {
        call("flickr.photos.getInfo", id)
            .respond_with(ResponseTemplate::new(200).set_body_json(info_payload(id)))
            .mount(server)
            .await;
        call("flickr.photos.getSizes", id)
            .respond_with(ResponseTemplate::new(200).set_body_json(sizes_payload(id)))
            .mount(server)
            .await;
    }
}

pub async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}
