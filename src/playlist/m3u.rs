//! M3U channel directory parsing

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::client::FetchText;

/// Marker that opens a channel record
const EXTINF_MARKER: &str = "#EXTINF:";

/// Name given to channels whose `#EXTINF` line carries no title
pub const DEFAULT_CHANNEL_NAME: &str = "Unknown Channel";

/// Group given to channels without a `group-title` attribute
pub const DEFAULT_GROUP: &str = "Uncategorized";

static LOGO_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)tvg-logo="([^"]*)""#).expect("valid logo regex"));

static GROUP_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)group-title="([^"]*)""#).expect("valid group regex"));

/// A playable channel from an M3U directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Same as `url`; playlists carry no independent identity
    pub id: String,
    pub name: String,
    pub url: String,
    pub logo: String,
    pub group: String,
}

/// Channel metadata collected from an `#EXTINF` line, waiting for its URL
#[derive(Debug, Default)]
struct PendingChannel {
    name: Option<String>,
    logo: Option<String>,
    group: Option<String>,
}

impl PendingChannel {
    fn from_extinf(line: &str) -> Self {
        let body = &line[EXTINF_MARKER.len()..];
        let name = match body.rfind(',') {
            Some(idx) => &body[idx + 1..],
            None => body,
        }
        .trim();

        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
            logo: capture(&LOGO_ATTR, line),
            group: capture(&GROUP_ATTR, line),
        }
    }

    fn finish(self, url: &str) -> Channel {
        Channel {
            id: url.to_string(),
            name: self
                .name
                .unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string()),
            url: url.to_string(),
            logo: self.logo.unwrap_or_default(),
            group: self.group.unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        }
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse M3U text into channels, in source order.
///
/// A URL line is attached to the most recent unconsumed `#EXTINF` line.
/// URL lines with no pending metadata are skipped, as are `#EXTINF` lines
/// that never receive a URL.
pub fn parse_m3u(text: &str) -> Vec<Channel> {
    let mut channels = Vec::new();
    let mut pending: Option<PendingChannel> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if line.starts_with(EXTINF_MARKER) {
            pending = Some(PendingChannel::from_extinf(line));
        } else if !line.starts_with('#') && line.contains("://") {
            if let Some(meta) = pending.take() {
                channels.push(meta.finish(line));
            }
        }
    }

    channels
}

/// Fetch and parse a channel directory.
///
/// Any fetch failure yields an empty list; the directory is non-critical.
pub async fn fetch_channels<F>(fetcher: &F, url: &str) -> Vec<Channel>
where
    F: FetchText + ?Sized,
{
    match fetcher.fetch_text(url).await {
        Ok(text) => {
            let channels = parse_m3u(&text);
            log::debug!("Parsed {} channels from {}", channels.len(), url);
            channels
        }
        Err(e) => {
            log::warn!("Failed to load playlist {}: {}", url, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockFetcher;
    use crate::error::FetchError;

    #[test]
    fn test_parse_single_channel_with_attributes() {
        let text = "#EXTINF:-1 tvg-logo=\"l.png\" group-title=\"News\",CNN\nhttp://x/cnn.m3u8";

        let channels = parse_m3u(text);

        assert_eq!(
            channels,
            vec![Channel {
                id: "http://x/cnn.m3u8".to_string(),
                name: "CNN".to_string(),
                url: "http://x/cnn.m3u8".to_string(),
                logo: "l.png".to_string(),
                group: "News".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_defaults_missing_fields() {
        let text = "#EXTM3U\n#EXTINF:-1,\nhttps://example.com/a.ts\n";

        let channels = parse_m3u(text);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, DEFAULT_CHANNEL_NAME);
        assert_eq!(channels[0].logo, "");
        assert_eq!(channels[0].group, DEFAULT_GROUP);
    }

    #[test]
    fn test_parse_name_uses_last_comma() {
        let text = "#EXTINF:-1 tvg-name=\"a,b\",Sports, Live\nhttp://x/s";

        let channels = parse_m3u(text);

        assert_eq!(channels[0].name, "Live");
    }

    #[test]
    fn test_parse_name_without_comma() {
        let text = "#EXTINF:Morning Show\nhttp://x/m";

        let channels = parse_m3u(text);

        assert_eq!(channels[0].name, "Morning Show");
    }

    #[test]
    fn test_parse_attributes_case_insensitive() {
        let text = "#EXTINF:-1 TVG-LOGO=\"L.PNG\" Group-Title=\"Kids\",Cartoons\nhttp://x/c";

        let channels = parse_m3u(text);

        assert_eq!(channels[0].logo, "L.PNG");
        assert_eq!(channels[0].group, "Kids");
    }

    #[test]
    fn test_url_without_metadata_is_skipped() {
        let text = "http://x/orphan\n#EXTINF:-1,One\nhttp://x/one\nhttp://x/extra";

        let channels = parse_m3u(text);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "http://x/one");
    }

    #[test]
    fn test_marker_without_url_contributes_nothing() {
        let text = "#EXTINF:-1,Dangling\n#EXTINF:-1,Two\n#EXTVLCOPT:http-referrer=http://r\nhttp://x/two\n#EXTINF:-1,Tail";

        let channels = parse_m3u(text);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Two");
        assert_eq!(channels[0].url, "http://x/two");
    }

    #[test]
    fn test_non_url_lines_are_ignored() {
        let text = "#EXTINF:-1,One\nnot a url\nhttp://x/one\r\n";

        let channels = parse_m3u(text);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "http://x/one");
    }

    #[test]
    fn test_channels_keep_source_order() {
        let text = "#EXTINF:-1,B\nhttp://x/b\n#EXTINF:-1,A\nhttp://x/a\n#EXTINF:-1,C\nhttp://x/c";

        let names: Vec<String> = parse_m3u(text).into_iter().map(|c| c.name).collect();

        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn test_fetch_channels_parses_body() {
        let mock = MockFetcher::new().with_body(
            "http://lists/tv.m3u",
            "#EXTINF:-1 group-title=\"Music\",MTV\nhttp://x/mtv",
        );

        let channels = fetch_channels(&mock, "http://lists/tv.m3u").await;

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].group, "Music");
    }

    #[tokio::test]
    async fn test_fetch_channels_fails_soft() {
        let mock = MockFetcher::new().with_error("http://lists/tv.m3u", FetchError::Status(404));

        let channels = fetch_channels(&mock, "http://lists/tv.m3u").await;

        assert!(channels.is_empty());
        assert_eq!(mock.calls("http://lists/tv.m3u"), 1);
    }
}
