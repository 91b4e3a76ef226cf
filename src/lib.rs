//! mediacache - playlist probing and metadata caches for media browsing clients
//!
//! - [`playlist`]: M3U channel directories and HLS resolution probing
//! - [`resolver`]: cached, coalesced resolution lookups
//! - [`cache`]: the content listing and detail aggregate caches

pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod playlist;
pub mod resolver;

pub use cache::{Caches, ContentListingCache, DetailAggregateCache};
pub use error::{Error, Result};
pub use resolver::ResolutionResolver;
