//! Ingest configuration
//!
//! Settings arrive through the command line, each flag backed by an environment
//! variable. A `.local.env` file in the working directory is loaded into the
//! environment first so the credential can live outside the shell history.

use clap::Parser;
use photosnap_common::{PhotosnapError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Defaults
// ============================================================================

/// Flickr REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.flickr.com/services/rest";

/// Dotenv file read before argument parsing
pub const DEFAULT_ENV_FILE: &str = ".local.env";

/// Minimum spacing between two calls to the photo service
pub const DEFAULT_CALL_INTERVAL_MS: u64 = 1000;

/// Per-request deadline
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retries after the first attempt for transient failures
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base backoff; attempt `n` waits `n * retry_delay`
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Resolved settings for one ingest run
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Flickr API key sent with every call
    pub api_key: String,
    pub endpoint: String,
    pub ingest_dir: PathBuf,
    pub output_dir: PathBuf,
    pub min_call_interval: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Regions processed at the same time
    pub region_concurrency: usize,
    /// Missing photos fetched at the same time within one region
    pub fetch_concurrency: usize,
    /// Restrict the run to these region names (empty = all)
    pub regions: Vec<String>,
    /// Diff only; no remote calls and no writes
    pub dry_run: bool,
}

impl IngestConfig {
    /// Configuration with defaults for everything but the credential
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ingest_dir: PathBuf::from("ingest"),
            output_dir: PathBuf::from("out"),
            min_call_interval: Duration::from_millis(DEFAULT_CALL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            region_concurrency: 1,
            fetch_concurrency: 1,
            regions: Vec::new(),
            dry_run: false,
        }
    }

    /// Reject settings that would make the run meaningless or hang
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PhotosnapError::config("FLICKR_API_KEY not set"));
        }
        if self.endpoint.trim().is_empty() {
            return Err(PhotosnapError::config("Photo service endpoint is empty"));
        }
        if self.min_call_interval.is_zero() {
            return Err(PhotosnapError::config(
                "PHOTOSNAP_CALL_INTERVAL_MS must be greater than 0",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(PhotosnapError::config("PHOTOSNAP_TIMEOUT_SECS must be greater than 0"));
        }
        if self.region_concurrency == 0 {
            return Err(PhotosnapError::config(
                "PHOTOSNAP_REGION_CONCURRENCY must be greater than 0",
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(PhotosnapError::config(
                "PHOTOSNAP_FETCH_CONCURRENCY must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Load `KEY=value` pairs from a dotenv file into the process environment.
///
/// A missing file is fine; variables already set in the environment win.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Loaded environment file");
            Ok(())
        },
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(PhotosnapError::config(format!(
            "Error loading {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Photosnap ingest - converge regional photo snapshots with their id lists
#[derive(Parser, Debug)]
#[command(name = "photosnap-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Flickr API key
    #[arg(long, env = "FLICKR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Flickr REST endpoint
    #[arg(long, env = "PHOTOSNAP_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Directory holding one `<region>.ndjson` id list per region
    #[arg(short, long, env = "PHOTOSNAP_INGEST_DIR", default_value = "ingest")]
    pub ingest_dir: PathBuf,

    /// Directory receiving one `<region>.ndjson` snapshot per region
    #[arg(short, long, env = "PHOTOSNAP_OUTPUT_DIR", default_value = "out")]
    pub output_dir: PathBuf,

    /// Minimum milliseconds between two calls to the photo service
    #[arg(long, env = "PHOTOSNAP_CALL_INTERVAL_MS", default_value_t = DEFAULT_CALL_INTERVAL_MS)]
    pub call_interval_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "PHOTOSNAP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retries for timeouts, connection failures, 429 and 5xx responses
    #[arg(long, env = "PHOTOSNAP_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Base retry backoff in milliseconds (multiplied by the attempt number)
    #[arg(long, env = "PHOTOSNAP_RETRY_DELAY_MS", default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    /// Regions processed concurrently
    #[arg(long, env = "PHOTOSNAP_REGION_CONCURRENCY", default_value_t = 1)]
    pub region_concurrency: usize,

    /// Photos fetched concurrently within a region
    #[arg(long, env = "PHOTOSNAP_FETCH_CONCURRENCY", default_value_t = 1)]
    pub fetch_concurrency: usize,

    /// Only process the named region (repeatable)
    #[arg(short, long = "region")]
    pub regions: Vec<String>,

    /// Report hits and misses without calling the service or writing snapshots
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Build and validate the run configuration
    pub fn into_config(self) -> Result<IngestConfig> {
        let api_key = self
            .api_key
            .ok_or_else(|| PhotosnapError::config("FLICKR_API_KEY not set"))?;

        let config = IngestConfig {
            api_key,
            endpoint: self.endpoint,
            ingest_dir: self.ingest_dir,
            output_dir: self.output_dir,
            min_call_interval: Duration::from_millis(self.call_interval_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            region_concurrency: self.region_concurrency,
            fetch_concurrency: self.fetch_concurrency,
            regions: self.regions,
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}
