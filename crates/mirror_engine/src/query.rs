use std::collections::{BTreeMap, HashSet};

use mirror_core::RawPage;
use mirror_logging::{mirror_debug, mirror_info};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{FetchError, HarvestError, JsonFetcher};

pub const DEFAULT_PAGE_LIMIT: u32 = 500;

/// `generator=images` query for the files used on one wiki page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiQuery {
    pub api_url: String,
    pub title: String,
    pub limit: u32,
}

impl WikiQuery {
    pub fn new(api_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            title: title.into(),
            limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Request URL for one page; `continuation` is appended verbatim.
    pub fn page_url(&self, continuation: &BTreeMap<String, String>) -> Result<String, FetchError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|err| FetchError::InvalidUrl(err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("action", "query")
                .append_pair("generator", "images")
                .append_pair("gimlimit", &self.limit.to_string())
                .append_pair("titles", &self.title)
                .append_pair("prop", "imageinfo")
                .append_pair("iiprop", "url")
                .append_pair("format", "json");
            for (key, value) in continuation {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(default, rename = "continue")]
    continuation: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Option<Pages>,
}

/// `formatversion=1` keys pages by id; `formatversion=2` returns a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Pages {
    Keyed(BTreeMap<String, PageRecord>),
    Listed(Vec<PageRecord>),
}

#[derive(Debug, Deserialize)]
struct PageRecord {
    title: String,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

impl Pages {
    fn into_records(self) -> Vec<RawPage> {
        let records = match self {
            Pages::Keyed(map) => {
                let mut keyed: Vec<_> = map.into_iter().collect();
                // Page ids are numeric strings; missing files use negative ids.
                keyed.sort_by_key(|(id, _)| id.parse::<i64>().unwrap_or(i64::MAX));
                keyed.into_iter().map(|(_, record)| record).collect()
            }
            Pages::Listed(list) => list,
        };
        records
            .into_iter()
            .map(|record| RawPage {
                title: record.title,
                url: record.imageinfo.into_iter().find_map(|info| info.url),
            })
            .collect()
    }
}

/// Follow `continue` tokens until the API reports no more pages.
///
/// Returns every page record of every response, or the first failure; partial
/// results are never returned.
pub async fn harvest_pages(
    fetcher: &dyn JsonFetcher,
    query: &WikiQuery,
) -> Result<Vec<RawPage>, HarvestError> {
    let mut records = Vec::new();
    let mut continuation = BTreeMap::new();
    let mut seen_continuations = HashSet::new();
    let mut page = 0;

    loop {
        page += 1;
        let url = query
            .page_url(&continuation)
            .map_err(|source| HarvestError::Fetch { page, source })?;
        mirror_debug!("Query page {} url={}", page, url);

        let body = fetcher
            .get_json(&url)
            .await
            .map_err(|source| HarvestError::Fetch { page, source })?;
        let response: QueryResponse =
            serde_json::from_value(body).map_err(|err| HarvestError::Fetch {
                page,
                source: FetchError::Parse(err.to_string()),
            })?;

        if let Some(error) = response.error {
            return Err(HarvestError::Api {
                page,
                code: error.code,
                info: error.info,
            });
        }

        let page_records = response
            .query
            .and_then(|body| body.pages)
            .map(Pages::into_records)
            .unwrap_or_default();
        mirror_debug!("Query page {} returned {} records", page, page_records.len());
        records.extend(page_records);

        match response.continuation {
            Some(next) if !next.is_empty() => {
                let next = stringify_values(next);
                if !seen_continuations.insert(next.clone()) {
                    return Err(HarvestError::StalledContinuation { page });
                }
                continuation = next;
            }
            _ => break,
        }
    }

    mirror_info!(
        "Harvested {} records for {:?} in {} pages",
        records.len(),
        query.title,
        page
    );
    Ok(records)
}

fn stringify_values(map: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}
