//! Content listing models

use serde::{Deserialize, Serialize};

/// Kind of content a listing row belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Movie,
    Tv,
    Record,
}

impl ContentType {
    /// Parse a persisted type literal. Unknown literals yield `None`.
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(ContentType::Movie),
            "tv" => Some(ContentType::Tv),
            "record" => Some(ContentType::Record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
            ContentType::Record => "record",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a paginated content listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowItem {
    /// Source-specific identifier
    pub id: String,

    /// Display title
    pub title: String,

    /// Poster / cover image URL
    #[serde(default)]
    pub poster: String,

    /// Source key the row was listed from
    #[serde(default)]
    pub source: String,

    /// Human-readable source name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Release year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Free-form remark (e.g. "updated to episode 12")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl RowItem {
    /// Minimal row with just an id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            poster: String::new(),
            source: String::new(),
            source_name: None,
            year: None,
            remarks: None,
        }
    }
}
