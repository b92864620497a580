use std::io;
use std::path::PathBuf;

use mirror_core::{HarvestItem, HarvestSource, ItemOutcome, RunStats};
use thiserror::Error;

use crate::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// Connection, DNS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    /// The body is not valid JSON or not the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    #[error("query page {page} failed: {source}")]
    Fetch {
        page: usize,
        #[source]
        source: FetchError,
    },
    #[error("api error on page {page}: {code}: {info}")]
    Api {
        page: usize,
        code: String,
        info: String,
    },
    #[error("continuation token already seen, repeated on page {page}")]
    StalledContinuation { page: usize },
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http status {code}")]
    HttpStatus { code: u16 },
    #[error("more than {limit} redirects")]
    RedirectLoop { limit: usize },
    #[error("redirect status {code} without location")]
    MissingLocation { code: u16 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Failures that end a run without a manifest.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("output directory unusable: {0}")]
    OutputDir(#[source] PersistError),
    #[error("harvest failed and no fallback items are available: {0}")]
    HarvestUnavailable(String),
    #[error("manifest write failed: {0}")]
    Manifest(#[source] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    HarvestStarted { title: String },
    HarvestFailed { error: String },
    ItemsResolved { count: usize, source: HarvestSource },
    ItemFinished {
        index: usize,
        total: usize,
        item: HarvestItem,
        outcome: ItemOutcome,
    },
    ManifestWritten { path: PathBuf, entries: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stats: RunStats,
    pub source: HarvestSource,
    pub harvest_error: Option<String>,
    pub items: Vec<HarvestItem>,
    pub outcomes: Vec<ItemOutcome>,
    pub manifest_path: PathBuf,
}

impl From<PersistError> for DownloadError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Io(io) => DownloadError::Io(io),
            PersistError::OutputDir(message) => DownloadError::Io(io::Error::other(message)),
        }
    }
}
