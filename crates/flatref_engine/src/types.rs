use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    EmptyBody,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::EmptyBody => write!(f, "empty body"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Per-item progress reported by the downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Saved {
        app_id: String,
        path: PathBuf,
        url: String,
        /// Running count of successful downloads in this run.
        ordinal: usize,
    },
    Skipped {
        app_id: String,
        path: PathBuf,
    },
    Failed {
        app_id: String,
        subject: Option<String>,
        attempts: Vec<FailedAttempt>,
    },
    WriteFailed {
        app_id: String,
        path: PathBuf,
        message: String,
    },
}

/// One URL that was tried for an item and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub url: String,
    pub error: FetchError,
}
