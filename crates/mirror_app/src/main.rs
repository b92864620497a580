mod config;
mod progress;
mod sources;

use std::path::PathBuf;

use anyhow::Context;
use log::LevelFilter;
use mirror_engine::Orchestrator;
use mirror_logging::{mirror_info, LogDestination};

fn main() -> anyhow::Result<()> {
    mirror_logging::initialize(LogDestination::Both, LevelFilter::Info);

    let config = config::load(std::env::args_os().nth(1).map(PathBuf::from))?;
    mirror_info!(
        "Mirroring images of {:?} into {:?}, manifest {:?}",
        config.page_title,
        config.output_dir,
        config.manifest_path
    );

    let orchestrator = Orchestrator::with_reqwest(
        config.run_config(sources::fallback_items()),
        config.fetch_settings(),
        config.download_settings(),
    );
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let report = runtime.block_on(orchestrator.run(&progress::StdoutProgress))?;
    println!("{}", progress::summary_line(&report.stats));
    Ok(())
}
