//! Mirror engine: HTTP harvest, downloads, persistence and effect execution.
mod download;
mod engine;
mod fetch;
mod manifest;
mod persist;
mod query;
mod types;

pub use download::{DownloadOutput, DownloadSettings, Downloader, ReqwestDownloader};
pub use engine::{Orchestrator, ProgressSink, RunConfig};
pub use fetch::{FetchSettings, JsonFetcher, ReqwestJsonFetcher, DEFAULT_USER_AGENT};
pub use manifest::{render_manifest, write_manifest};
pub use persist::{artifact_exists, ensure_output_dir, AtomicFileWriter, PendingFile, PersistError};
pub use query::{harvest_pages, WikiQuery, DEFAULT_PAGE_LIMIT};
pub use types::{DownloadError, FetchError, HarvestError, RunError, RunEvent, RunReport};
