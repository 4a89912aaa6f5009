//! Error types for Photosnap
//!
//! Every failure in the pipeline maps onto one of four categories: configuration,
//! transport, malformed response, or persistence. The helpers on [`PhotosnapError`]
//! tell the caller whether a failure is worth retrying, whether it only affects a
//! single photo id, or whether it must abort the region.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Photosnap operations
pub type Result<T> = std::result::Result<T, PhotosnapError>;

/// Flickr `stat=fail` codes that concern only the requested photo
/// (1 "Photo not found", 2 "Permission denied")
pub const PHOTO_LEVEL_API_CODES: [i64; 2] = [1, 2];

/// Flickr `stat=fail` codes rejecting the caller's credential rather than a photo
/// (95 SSL required through 100 "Invalid API Key")
pub const CREDENTIAL_API_CODES: std::ops::RangeInclusive<i64> = 95..=100;

/// Flickr "Service currently unavailable"
pub const SERVICE_UNAVAILABLE_API_CODE: i64 = 105;

/// Sub-kind of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request exceeded its deadline
    Timeout,
    /// Connection could not be established
    Connect,
    /// Service answered 429 Too Many Requests
    RateLimited,
    /// Service answered with a 5xx status
    Server(u16),
    /// Service answered with a 4xx status other than 429
    Client(u16),
    /// Anything else reqwest reports (body read, redirect loop, ...)
    Other,
}

impl TransportKind {
    /// Classify a non-success HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => TransportKind::RateLimited,
            500..=599 => TransportKind::Server(status),
            _ => TransportKind::Client(status),
        }
    }

    /// 401, 403 and 407 reject the caller, not the photo
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TransportKind::Client(401 | 403 | 407))
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Timeout => write!(f, "timeout"),
            TransportKind::Connect => write!(f, "connect"),
            TransportKind::RateLimited => write!(f, "rate limited (429)"),
            TransportKind::Server(status) => write!(f, "server error ({})", status),
            TransportKind::Client(status) => write!(f, "client error ({})", status),
            TransportKind::Other => write!(f, "other"),
        }
    }
}

/// Main error type for Photosnap
#[derive(Error, Debug)]
pub enum PhotosnapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed ingest data in {path} at line {line}: {reason}")]
    Ingest {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Transport error ({kind}): {message}")]
    Transport {
        kind: TransportKind,
        message: String,
    },

    #[error("Malformed response from {method}: {reason}")]
    MalformedResponse { method: String, reason: String },

    #[error("{method} failed with code {code}: {message}")]
    Api {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Snapshot error at {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Run cancelled before snapshot was written")]
    Cancelled,
}

impl PhotosnapError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(kind: TransportKind, msg: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: msg.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Transient conditions that may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { kind, .. } => matches!(
                kind,
                TransportKind::Timeout
                    | TransportKind::Connect
                    | TransportKind::RateLimited
                    | TransportKind::Server(_)
            ),
            Self::Api { code, .. } => *code == SERVICE_UNAVAILABLE_API_CODE,
            _ => false,
        }
    }

    /// Failures tied to one photo id; siblings in the region can still proceed
    ///
    /// Credential and service-wide rejections are never skippable.
    pub fn is_skippable(&self) -> bool {
        match self {
            Self::Transport {
                kind: kind @ TransportKind::Client(_),
                ..
            } => !kind.is_auth_failure(),
            Self::Api { code, .. } => PHOTO_LEVEL_API_CODES.contains(code),
            _ => false,
        }
    }
}
