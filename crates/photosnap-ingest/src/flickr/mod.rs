//! Flickr REST client
//!
//! Two calls are needed per photo: `flickr.photos.getInfo` for descriptive
//! metadata and `flickr.photos.getSizes` for the image renditions. Every call
//! carries the API key plus `format=json&nojsoncallback=1` and waits on the shared
//! [`RateLimiter`] before it is sent, retries included.

pub mod models;

use crate::config::IngestConfig;
use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use models::{InfoResponse, PhotoInfo, PhotoSizes, SizesResponse, Status};
use photosnap_common::error::CREDENTIAL_API_CODES;
use photosnap_common::{PhotosnapError, Result, TransportKind};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub const METHOD_GET_INFO: &str = "flickr.photos.getInfo";
pub const METHOD_GET_SIZES: &str = "flickr.photos.getSizes";

/// Where photo metadata comes from
///
/// [`FlickrClient`] is the production implementation; the reconciler only sees
/// this trait.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Nested descriptive metadata for one photo
    async fn fetch_info(&self, photo_id: &str) -> Result<PhotoInfo>;

    /// Size variants for one photo, in service order
    async fn fetch_sizes(&self, photo_id: &str) -> Result<PhotoSizes>;
}

/// Rate-limited, retrying Flickr REST client
pub struct FlickrClient {
    client: Client,
    endpoint: String,
    api_key: String,
    limiter: RateLimiter,
    max_retries: u32,
    retry_delay: Duration,
}

impl FlickrClient {
    pub fn new(config: &IngestConfig, limiter: RateLimiter) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("photosnap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PhotosnapError::config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            limiter,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Call `method` for `photo_id`, retrying transient failures with linear backoff
    async fn call<T: DeserializeOwned>(&self, method: &str, photo_id: &str) -> Result<T> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.call_once(method, photo_id).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    let delay = self.retry_delay * attempt;
                    warn!(
                        method,
                        photo_id,
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Call failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(&self, method: &str, photo_id: &str) -> Result<T> {
        self.limiter.acquire().await;
        debug!(method, photo_id, "Calling Flickr API");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("method", method),
                ("photo_id", photo_id),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("nojsoncallback", "1"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PhotosnapError::transport(
                TransportKind::from_status(status.as_u16()),
                format!("{} for photo {} returned HTTP {}", method, photo_id, status),
            ));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        decode_payload(method, &body)
    }
}

#[async_trait]
impl MetadataSource for FlickrClient {
    async fn fetch_info(&self, photo_id: &str) -> Result<PhotoInfo> {
        let response: InfoResponse = self.call(METHOD_GET_INFO, photo_id).await?;
        Ok(response.photo)
    }

    async fn fetch_sizes(&self, photo_id: &str) -> Result<PhotoSizes> {
        let response: SizesResponse = self.call(METHOD_GET_SIZES, photo_id).await?;
        Ok(response.sizes)
    }
}

/// Decode a 200 response body, surfacing `"stat": "fail"` replies as errors
///
/// A rejected credential becomes a configuration error; every other failure code
/// is an API error classified by [`PhotosnapError::is_skippable`] and
/// [`PhotosnapError::is_retryable`].
pub(crate) fn decode_payload<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<T> {
    let status: Status =
        serde_json::from_slice(body).map_err(|e| PhotosnapError::malformed(method, e.to_string()))?;

    if status.stat.as_deref() == Some("fail") {
        let code = status.code.unwrap_or_default();
        let message = status.message.unwrap_or_default();

        if CREDENTIAL_API_CODES.contains(&code) {
            return Err(PhotosnapError::config(format!(
                "{} rejected the API key (code {}): {}",
                method, code, message
            )));
        }

        return Err(PhotosnapError::Api {
            method: method.to_string(),
            code,
            message,
        });
    }

    serde_json::from_slice(body).map_err(|e| PhotosnapError::malformed(method, e.to_string()))
}

// The URL is dropped from the message because its query string holds the API key.
fn transport_error(e: reqwest::Error) -> PhotosnapError {
    let kind = if e.is_timeout() {
        TransportKind::Timeout
    } else if e.is_connect() {
        TransportKind::Connect
    } else if let Some(status) = e.status() {
        TransportKind::from_status(status.as_u16())
    } else {
        TransportKind::Other
    };

    PhotosnapError::transport(kind, e.without_url().to_string())
}
