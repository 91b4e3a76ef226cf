//! Per-title search and source models

use serde::{Deserialize, Serialize};

/// A title found on one source, annotated with its best stream resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: String,

    /// Source key (e.g. "heimuer")
    pub source: String,

    /// Human-readable source name
    pub source_name: String,

    #[serde(default)]
    pub poster: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Episode stream URLs in play order
    #[serde(default)]
    pub episodes: Vec<String>,

    /// Episode labels, parallel to `episodes`
    #[serde(default)]
    pub episode_titles: Vec<String>,

    /// Best resolution label of the first episode, e.g. "1080p"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// Summary of one source offering a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source: String,
    pub source_name: String,
    #[serde(default)]
    pub resolution: Option<String>,
}

impl From<&SearchResult> for SourceSummary {
    fn from(result: &SearchResult) -> Self {
        Self {
            source: result.source.clone(),
            source_name: result.source_name.clone(),
            resolution: result.resolution.clone(),
        }
    }
}
