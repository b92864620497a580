use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use mirror_logging::mirror_debug;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::StatusCode;
use url::Url;

use crate::fetch::DEFAULT_USER_AGENT;
use crate::persist::AtomicFileWriter;
use crate::DownloadError;

const BINARY_ACCEPT: &str = "image/avif,image/webp,image/*,application/octet-stream;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_redirects: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutput {
    pub path: PathBuf,
    pub final_url: String,
    pub redirect_count: usize,
    pub bytes_written: u64,
}

/// Fetch a binary resource into `dest`. On error `dest` is left as it was.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadOutput, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    settings: DownloadSettings,
}

impl ReqwestDownloader {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, DownloadError> {
        // Redirects are followed by hand so every hop is counted here.
        reqwest::Client::builder()
            .user_agent(self.settings.user_agent.clone())
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| DownloadError::Transport(err.to_string()))
    }
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<DownloadOutput, DownloadError> {
        let mut current =
            Url::parse(url).map_err(|err| DownloadError::InvalidUrl(err.to_string()))?;
        let (dir, filename) = split_destination(dest)?;
        let client = self.build_client()?;

        let mut redirect_count = 0;
        let response = loop {
            let response = client
                .get(current.clone())
                .header(ACCEPT, BINARY_ACCEPT)
                .send()
                .await
                .map_err(|err| DownloadError::Transport(err.to_string()))?;

            let status = response.status();
            if is_followed_redirect(status) {
                redirect_count += 1;
                if redirect_count > self.settings.max_redirects {
                    return Err(DownloadError::RedirectLoop {
                        limit: self.settings.max_redirects,
                    });
                }
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(DownloadError::MissingLocation {
                        code: status.as_u16(),
                    })?;
                current = current
                    .join(location)
                    .map_err(|err| DownloadError::InvalidUrl(err.to_string()))?;
                mirror_debug!("Redirect {} -> {}", redirect_count, current);
                continue;
            }
            if status != StatusCode::OK {
                return Err(DownloadError::HttpStatus {
                    code: status.as_u16(),
                });
            }
            break response;
        };

        let mut pending = AtomicFileWriter::new(dir).begin(filename)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|err| DownloadError::Io(io::Error::new(io::ErrorKind::Interrupted, err)))?;
            pending.write_chunk(&chunk)?;
        }
        let bytes_written = pending.bytes_written();
        let path = pending.commit()?;

        Ok(DownloadOutput {
            path,
            final_url: current.to_string(),
            redirect_count,
            bytes_written,
        })
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn split_destination(dest: &Path) -> Result<(PathBuf, &str), DownloadError> {
    let filename = dest
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            DownloadError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("destination {dest:?} has no file name"),
            ))
        })?;
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, filename))
}
