//! Resolution display model

use serde::Serialize;
use tabled::Tabled;

/// Label printed when no resolution could be determined
pub const UNKNOWN_RESOLUTION: &str = "unknown";

/// One resolved stream URL for table/JSON output.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ResolutionDisplay {
    #[tabled(rename = "RESOLUTION")]
    #[serde(skip)]
    pub label: String,

    #[tabled(rename = "URL")]
    pub url: String,

    #[tabled(skip)]
    pub resolution: Option<String>,
}

impl ResolutionDisplay {
    pub fn new(url: impl Into<String>, resolution: Option<String>) -> Self {
        Self {
            label: resolution
                .clone()
                .unwrap_or_else(|| UNKNOWN_RESOLUTION.to_string()),
            url: url.into(),
            resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_label() {
        let row = ResolutionDisplay::new("http://x/a.mp4", None);
        assert_eq!(row.label, "unknown");

        let json = serde_json::to_value(&row).unwrap();
        assert!(json["resolution"].is_null());
    }

    #[test]
    fn test_known_label() {
        let row = ResolutionDisplay::new("http://x/a.m3u8", Some("720p".to_string()));
        assert_eq!(row.label, "720p");
    }
}
