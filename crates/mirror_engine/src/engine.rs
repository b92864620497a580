use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mirror_core::{
    update, Effect, ExtractRules, HarvestItem, HarvestSource, ItemOutcome, Msg, Phase, RunState,
};
use mirror_logging::{mirror_debug, mirror_info, mirror_warn};
use tokio::time::Instant;

use crate::{
    artifact_exists, ensure_output_dir, harvest_pages, write_manifest, DownloadSettings,
    Downloader, FetchSettings, JsonFetcher, ReqwestDownloader, ReqwestJsonFetcher, RunError,
    RunEvent, RunReport, WikiQuery,
};

const DEADLINE_REASON: &str = "deadline exceeded";

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub query: WikiQuery,
    pub rules: ExtractRules,
    /// Substituted when the query fails; never when it returns nothing.
    pub fallback: Vec<HarvestItem>,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Wall-clock budget for the whole run, measured from `run`.
    pub deadline: Option<Duration>,
}

/// Executes the effects of [`mirror_core::update`] one at a time.
pub struct Orchestrator {
    config: RunConfig,
    fetcher: Arc<dyn JsonFetcher>,
    downloader: Arc<dyn Downloader>,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        fetcher: Arc<dyn JsonFetcher>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            config,
            fetcher,
            downloader,
        }
    }

    pub fn with_reqwest(config: RunConfig, fetch: FetchSettings, download: DownloadSettings) -> Self {
        Self::new(
            config,
            Arc::new(ReqwestJsonFetcher::new(fetch)),
            Arc::new(ReqwestDownloader::new(download)),
        )
    }

    /// Harvest, mirror and write the manifest.
    ///
    /// Item failures are part of the report; only an unusable output
    /// directory, a harvest failure without fallback items or a failed
    /// manifest write end the run with an error.
    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<RunReport, RunError> {
        ensure_output_dir(&self.config.output_dir).map_err(RunError::OutputDir)?;
        let deadline = self.config.deadline.map(|budget| Instant::now() + budget);

        let mut state = RunState::new(self.config.rules.clone());
        let mut inbox = VecDeque::from([Msg::Start]);
        while let Some(msg) = inbox.pop_front() {
            let resolved_before = state.source().is_some();
            let finished_before = state.outcomes().len();

            let (next, effects) = update(state, msg);
            state = next;
            emit_progress(&state, resolved_before, finished_before, sink);

            for effect in effects {
                if let Some(reply) = self.execute(effect, deadline, sink).await? {
                    inbox.push_back(reply);
                }
            }
        }

        if state.phase() == Phase::Aborted {
            let reason = state.harvest_error().unwrap_or("unknown error").to_string();
            return Err(RunError::HarvestUnavailable(reason));
        }

        let report = RunReport {
            stats: state.stats(),
            source: state.source().unwrap_or(HarvestSource::Remote),
            harvest_error: state.harvest_error().map(ToOwned::to_owned),
            items: state.items().to_vec(),
            outcomes: state.outcomes().to_vec(),
            manifest_path: self.config.manifest_path.clone(),
        };
        mirror_info!(
            "Run finished: {} downloaded, {} skipped, {} failed",
            report.stats.downloaded,
            report.stats.skipped,
            report.stats.failed
        );
        Ok(report)
    }

    async fn execute(
        &self,
        effect: Effect,
        deadline: Option<Instant>,
        sink: &dyn ProgressSink,
    ) -> Result<Option<Msg>, RunError> {
        match effect {
            Effect::Harvest => {
                sink.emit(RunEvent::HarvestStarted {
                    title: self.config.query.title.clone(),
                });
                let harvest = harvest_pages(self.fetcher.as_ref(), &self.config.query);
                let error = match within(deadline, harvest).await {
                    Some(Ok(pages)) => return Ok(Some(Msg::HarvestCompleted(pages))),
                    Some(Err(err)) => err.to_string(),
                    None => DEADLINE_REASON.to_string(),
                };
                mirror_warn!("Harvest failed, switching to fallback list: {}", error);
                sink.emit(RunEvent::HarvestFailed {
                    error: error.clone(),
                });
                Ok(Some(Msg::HarvestFailed(error)))
            }
            Effect::LoadFallback => {
                mirror_info!("Loading {} fallback items", self.config.fallback.len());
                Ok(Some(Msg::FallbackLoaded(self.config.fallback.clone())))
            }
            Effect::MirrorItem { index, item } => {
                match within(deadline, self.mirror_item(&item)).await {
                    Some(outcome) => Ok(Some(Msg::ItemMirrored { index, outcome })),
                    None => {
                        mirror_warn!(
                            "Deadline exceeded while mirroring {}",
                            item.canonical_filename
                        );
                        Ok(Some(Msg::DeadlineExpired))
                    }
                }
            }
            Effect::WriteManifest { entries } => {
                let path = write_manifest(&self.config.manifest_path, &entries)
                    .map_err(RunError::Manifest)?;
                mirror_info!("Wrote manifest {:?} with {} entries", path, entries.len());
                sink.emit(RunEvent::ManifestWritten {
                    path,
                    entries: entries.len(),
                });
                Ok(None)
            }
        }
    }

    async fn mirror_item(&self, item: &HarvestItem) -> ItemOutcome {
        let dir = &self.config.output_dir;
        if artifact_exists(dir, &item.canonical_filename) {
            mirror_debug!("Skipping {}: already mirrored", item.canonical_filename);
            return ItemOutcome::Skipped;
        }
        let Some(url) = item.source_url.as_deref() else {
            return ItemOutcome::Failed("no source url".to_string());
        };

        let dest = dir.join(&item.canonical_filename);
        match self.downloader.download(url, &dest).await {
            Ok(output) => {
                mirror_info!(
                    "Downloaded {} ({} bytes, {} redirects)",
                    item.canonical_filename,
                    output.bytes_written,
                    output.redirect_count
                );
                ItemOutcome::Downloaded
            }
            Err(err) => {
                mirror_warn!("Failed to mirror {} from {}: {}", item.canonical_filename, url, err);
                ItemOutcome::Failed(err.to_string())
            }
        }
    }
}

/// Report what the last transition resolved: the item list once, then every
/// newly finished item.
fn emit_progress(
    state: &RunState,
    resolved_before: bool,
    finished_before: usize,
    sink: &dyn ProgressSink,
) {
    if let (false, Some(source)) = (resolved_before, state.source()) {
        sink.emit(RunEvent::ItemsResolved {
            count: state.items().len(),
            source,
        });
    }
    let total = state.items().len();
    for (index, outcome) in state.outcomes().iter().enumerate().skip(finished_before) {
        sink.emit(RunEvent::ItemFinished {
            index,
            total,
            item: state.items()[index].clone(),
            outcome: outcome.clone(),
        });
    }
}

async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}
