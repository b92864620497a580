//! One stdout line per item plus a closing summary.

use mirror_core::{HarvestSource, ItemOutcome, RunStats};
use mirror_engine::{ProgressSink, RunEvent};

pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&self, event: RunEvent) {
        println!("{}", format_event(&event));
    }
}

pub fn format_event(event: &RunEvent) -> String {
    match event {
        RunEvent::HarvestStarted { title } => format!("Harvesting images used on {title:?}"),
        RunEvent::HarvestFailed { error } => {
            format!("Harvest failed ({error}); using the built-in list")
        }
        RunEvent::ItemsResolved { count, source } => {
            let origin = match source {
                HarvestSource::Remote => "wiki",
                HarvestSource::Fallback => "fallback list",
            };
            format!("{count} images from the {origin}")
        }
        RunEvent::ItemFinished {
            index,
            total,
            item,
            outcome,
        } => {
            let position = format!("[{}/{}]", index + 1, total);
            match outcome {
                ItemOutcome::Downloaded => {
                    format!("✓ {position} {} -> {}", item.display_name, item.canonical_filename)
                }
                ItemOutcome::Skipped => {
                    format!("- {position} {} (already mirrored)", item.display_name)
                }
                ItemOutcome::Failed(message) => {
                    format!("✗ {position} {}: {message}", item.display_name)
                }
            }
        }
        RunEvent::ManifestWritten { path, entries } => {
            format!("Wrote {entries} entries to {}", path.display())
        }
    }
}

pub fn summary_line(stats: &RunStats) -> String {
    format!(
        "Done: {} downloaded, {} skipped, {} failed",
        stats.downloaded, stats.skipped, stats.failed
    )
}
