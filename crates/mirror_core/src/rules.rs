use serde::{Deserialize, Serialize};

/// Order of extracted items, and therefore of mirroring and the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemOrder {
    /// Arrival order from pagination.
    Source,
    /// Lexicographic by display name.
    #[default]
    DisplayName,
}

/// Source-specific predicates for turning raw page titles into items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractRules {
    /// Title prefixes of the file namespace, matched case-insensitively.
    pub namespaces: Vec<String>,
    /// Accepted image extensions without the dot, matched case-insensitively.
    pub extensions: Vec<String>,
    /// Case-sensitive substrings of the raw title that drop a record.
    pub exclusions: Vec<String>,
    /// Escaped sequences and their literal replacement.
    pub unescapes: Vec<(String, String)>,
    /// Characters turned into spaces in the display name.
    pub separators: Vec<char>,
    /// Suffixes naming the rendition rather than the subject, e.g. `_poster`.
    pub subject_suffixes: Vec<String>,
    /// Suffixes marking an alternate rendition, e.g. `_sq`.
    pub alternate_markers: Vec<String>,
    pub order: ItemOrder,
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self {
            namespaces: vec!["File:".to_string(), "Image:".to_string()],
            extensions: ["png", "jpg", "jpeg", "gif", "webp"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            exclusions: Vec::new(),
            unescapes: vec![
                ("%27".to_string(), "'".to_string()),
                ("%26".to_string(), "&".to_string()),
                ("&#39;".to_string(), "'".to_string()),
                ("&amp;".to_string(), "&".to_string()),
            ],
            separators: vec!['_'],
            subject_suffixes: Vec::new(),
            alternate_markers: Vec::new(),
            order: ItemOrder::DisplayName,
        }
    }
}
