//! Domain models shared by the caches
//!
//! Listing rows come from the content-listing collaborator, search results and
//! source summaries from the per-title source fan-out.

pub mod display;
mod listing;
mod search;

pub use display::{ChannelDisplay, ResolutionDisplay};
pub use listing::{ContentType, RowItem};
pub use search::{SearchResult, SourceSummary};
