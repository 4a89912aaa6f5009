//! Shared call-rate limiter for the photo service
//!
//! The service's usage policy applies to the API key, not to a region or worker,
//! so one limiter is created per run and cloned into every client.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as Governor,
};
use photosnap_common::{PhotosnapError, Result};
use std::sync::Arc;
use std::time::Duration;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock>;

/// Token bucket allowing one call per `interval`, with no burst
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<DirectLimiter>,
    interval: Duration,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Result<Self> {
        let quota = Quota::with_period(interval).ok_or_else(|| {
            PhotosnapError::config("Rate limit interval must be greater than 0")
        })?;

        Ok(Self {
            inner: Arc::new(Governor::direct(quota)),
            interval,
        })
    }

    /// Wait until the next call is allowed
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval", &self.interval)
            .finish()
    }
}
