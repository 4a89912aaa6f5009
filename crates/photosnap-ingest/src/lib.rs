//! Photosnap Ingest Library
//!
//! Keeps one metadata snapshot per region in step with that region's list of
//! Flickr photo ids, calling the Flickr API only for ids the snapshot lacks.
//!
//! # Pipeline
//!
//! - **ids**: read a region's ingest list
//! - **snapshot**: read and atomically replace a region's snapshot
//! - **flickr**: rate-limited `getInfo` / `getSizes` calls
//! - **transform**: flatten Flickr payloads into snapshot records
//! - **reconcile**: diff, fetch, merge and persist one region
//! - **orchestrator**: discover regions and run them
//!
//! # Example
//!
//! ```no_run
//! use photosnap_ingest::config::IngestConfig;
//! use photosnap_ingest::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::new(std::env::var("FLICKR_API_KEY")?);
//!     let summary = Orchestrator::from_config(config)?.run().await?;
//!     println!("{} regions reconciled", summary.reports.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod flickr;
pub mod ids;
pub mod ndjson;
pub mod orchestrator;
pub mod rate_limit;
pub mod reconcile;
pub mod snapshot;
pub mod transform;

pub use config::{Cli, IngestConfig};
pub use orchestrator::{Orchestrator, RunSummary};
