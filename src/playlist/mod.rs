//! Playlist parsing
//!
//! Two line-oriented formats are understood:
//! - M3U channel directories (`#EXTINF` + URL pairs), see [`m3u`]
//! - HLS master playlists (`#EXT-X-STREAM-INF` variants), see [`hls`]
//!
//! Parsing is pure. The `fetch_*`/`get_*` wrappers pull text through a
//! [`FetchText`](crate::client::FetchText) collaborator and fail soft.

pub mod hls;
pub mod m3u;

pub use hls::{
    get_resolution_from_m3u8, is_hls_playlist, parse_resolution, probe_resolution,
};
pub use m3u::{Channel, DEFAULT_CHANNEL_NAME, DEFAULT_GROUP, fetch_channels, parse_m3u};
