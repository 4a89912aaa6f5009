//! Photosnap Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, error handling, and logging for the Photosnap workspace.
//!
//! - **Types**: the persisted [`types::Entry`] record and its [`types::PictureSize`] variants
//! - **Errors**: [`PhotosnapError`] and its retry/skip classification
//! - **Logging**: tracing subscriber setup shared by all binaries

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{PhotosnapError, Result, TransportKind};
pub use types::{Entry, PictureSize, Region};
