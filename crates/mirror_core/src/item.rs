/// One record of the wiki API's `query.pages` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub title: String,
    /// First `imageinfo` URL, if the API returned one.
    pub url: Option<String>,
}

impl RawPage {
    pub fn new(title: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            title: title.into(),
            url: url.map(ToOwned::to_owned),
        }
    }
}

/// Unit of work for a run and source of its manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestItem {
    pub display_name: String,
    pub canonical_filename: String,
    pub source_url: Option<String>,
}

impl HarvestItem {
    pub fn new(
        display_name: impl Into<String>,
        canonical_filename: impl Into<String>,
        source_url: Option<&str>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            canonical_filename: canonical_filename.into(),
            source_url: source_url.map(ToOwned::to_owned),
        }
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry {
            name: self.display_name.clone(),
            filename: self.canonical_filename.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Downloaded,
    /// Local artifact already present; no network access happened.
    Skipped,
    Failed(String),
}
