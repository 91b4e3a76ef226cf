//! HLS master playlist resolution detection

use std::sync::LazyLock;

use regex::Regex;

use crate::client::FetchText;
use crate::error::FetchError;

const STREAM_INF_MARKER: &str = "#EXT-X-STREAM-INF";

static RESOLUTION_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)RESOLUTION=(\d+)x(\d+)").expect("valid resolution regex")
});

/// Whether a URL looks like an HLS playlist (`.m3u8`, any case).
///
/// Other URLs are never fetched for resolution probing.
pub fn is_hls_playlist(url: &str) -> bool {
    url.to_ascii_lowercase().ends_with(".m3u8")
}

/// Find the label of the tallest variant stream, e.g. `"1080p"`.
///
/// Only a strictly taller variant replaces the current best, so the first
/// variant seen at the winning height is the one reported.
pub fn parse_resolution(text: &str) -> Option<String> {
    let mut best: Option<u32> = None;

    for line in text.lines().map(str::trim) {
        if !line.starts_with(STREAM_INF_MARKER) {
            continue;
        }

        let Some(height) = RESOLUTION_ATTR
            .captures(line)
            .and_then(|caps| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            continue;
        };

        if best.is_none_or(|current| height > current) {
            best = Some(height);
        }
    }

    best.map(|height| format!("{}p", height))
}

/// Probe a stream URL for its best resolution.
///
/// - `Ok(Some(label))` - the playlist declares at least one resolution
/// - `Ok(None)` - not an HLS URL, or no resolution tag present
/// - `Err(_)` - the playlist could not be fetched
pub async fn probe_resolution<F>(fetcher: &F, url: &str) -> Result<Option<String>, FetchError>
where
    F: FetchText + ?Sized,
{
    if !is_hls_playlist(url) {
        return Ok(None);
    }

    let text = fetcher.fetch_text(url).await?;
    Ok(parse_resolution(&text))
}

/// Fail-soft variant of [`probe_resolution`]: fetch failures read as `None`.
pub async fn get_resolution_from_m3u8<F>(fetcher: &F, url: &str) -> Option<String>
where
    F: FetchText + ?Sized,
{
    match probe_resolution(fetcher, url).await {
        Ok(resolution) => resolution,
        Err(e) => {
            log::debug!("Resolution probe failed for {}: {}", url, e);
            None
        }
    }
}
