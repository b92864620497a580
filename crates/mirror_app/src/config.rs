//! Run configuration, read from a RON file when one is present.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use mirror_core::{ExtractRules, HarvestItem};
use mirror_engine::{
    DownloadSettings, FetchSettings, RunConfig, WikiQuery, DEFAULT_PAGE_LIMIT, DEFAULT_USER_AGENT,
};
use serde::Deserialize;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mirror.ron";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub page_title: String,
    pub page_limit: u32,
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub max_redirects: usize,
    pub deadline_secs: Option<u64>,
    pub rules: ExtractRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        let download = DownloadSettings::default();
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            page_title: "Studio Ghibli".to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            output_dir: PathBuf::from("static/images/films"),
            manifest_path: PathBuf::from("data/films.json"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            download_timeout_secs: download.request_timeout.as_secs(),
            max_redirects: download.max_redirects,
            deadline_secs: None,
            rules: ExtractRules {
                exclusions: ["logo", "Logo", "collage", "Collage", "Wiki_letter", "Wiki letter"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                subject_suffixes: ["_film_poster", "_poster"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                alternate_markers: vec!["_sq".to_string(), "_square".to_string()],
                ..ExtractRules::default()
            },
        }
    }
}

impl AppConfig {
    pub fn run_config(&self, fallback: Vec<HarvestItem>) -> RunConfig {
        RunConfig {
            query: WikiQuery {
                api_url: self.api_url.clone(),
                title: self.page_title.clone(),
                limit: self.page_limit,
            },
            rules: self.rules.clone(),
            fallback,
            output_dir: self.output_dir.clone(),
            manifest_path: self.manifest_path.clone(),
            deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            user_agent: self.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            user_agent: self.user_agent.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.download_timeout_secs),
            max_redirects: self.max_redirects,
        }
    }
}

/// Load `explicit`, else `./mirror.ron` if it exists, else the defaults.
pub fn load(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                return Ok(AppConfig::default());
            }
            path
        }
    };
    load_file(&path)
}

fn load_file(path: &Path) -> anyhow::Result<AppConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading config file {path:?}"))?;
    parse(&text).with_context(|| format!("parsing config file {path:?}"))
}

pub fn parse(text: &str) -> anyhow::Result<AppConfig> {
    Ok(ron::from_str(text)?)
}
