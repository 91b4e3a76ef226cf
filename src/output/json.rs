//! JSON output formatting

use chrono::Utc;
use serde::Serialize;

/// Envelope for JSON output: the rows plus when and by what they were produced
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a, T> {
    pub data: &'a [T],
    pub meta: Metadata,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    /// RFC 3339 generation time
    pub timestamp: String,
    pub version: String,
    /// Number of rows in `data`
    pub count: usize,
}

impl<'a, T: Serialize> JsonOutput<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self {
            data,
            meta: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                count: data.len(),
            },
        }
    }
}

/// Format rows as pretty-printed JSON
pub fn format_json<T: Serialize>(rows: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(rows))
}
