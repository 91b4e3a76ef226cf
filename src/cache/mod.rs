//! Metadata caches
//!
//! - [`ContentListingCache`]: paginated listing rows, persisted to a
//!   [`KeyValueStore`] (SQLite on disk by default)
//! - [`DetailAggregateCache`]: per-title aggregates, memory only
//! - [`ResolutionResolver`](crate::resolver::ResolutionResolver): stream
//!   resolutions, memory only
//!
//! [`Caches`] builds all three from a [`Config`] once at start-up.

pub mod clock;
pub mod detail;
pub mod key;
pub mod listing;
pub mod storage;

use std::sync::Arc;

use crate::client::FetchText;
use crate::config::Config;
use crate::resolver::ResolutionResolver;

pub use clock::{Clock, ManualClock, SystemClock};
pub use detail::{DetailAggregateCache, DetailEntry, DetailLimits};
pub use key::listing_key;
pub use listing::{CacheItem, ContentListingCache, ListingLimits, STORAGE_KEY};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};

/// Every cache the application uses, wired from one configuration.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct Caches {
    pub resolutions: ResolutionResolver,
    pub listings: ContentListingCache,
    pub details: Arc<DetailAggregateCache>,
}

impl Caches {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn FetchText>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            resolutions: ResolutionResolver::from_config(
                &config.resolution,
                fetcher,
                Arc::clone(&clock),
            ),
            listings: ContentListingCache::new(
                store,
                Arc::clone(&clock),
                ListingLimits::from(&config.listing),
            ),
            details: Arc::new(DetailAggregateCache::new(
                clock,
                DetailLimits::from(&config.detail),
            )),
        }
    }

    /// Build with the wall clock and the configured listing store.
    ///
    /// An unusable on-disk store degrades to memory only; caching still works
    /// for the life of the process.
    pub fn from_config(config: &Config, fetcher: Arc<dyn FetchText>) -> Self {
        Self::new(config, fetcher, open_store(config), Arc::new(SystemClock))
    }

    /// Empty every cache. Never fails.
    pub fn clear_all(&self) {
        self.resolutions.clear();
        self.listings.clear();
        self.details.clear();
    }
}

/// Open the listing store the configuration asks for
pub fn open_store(config: &Config) -> Arc<dyn KeyValueStore> {
    if !config.listing.persist {
        log::debug!("Listing persistence disabled");
        return Arc::new(MemoryStore::new());
    }

    let opened = match &config.listing.storage_dir {
        Some(dir) => SqliteStore::open_at(dir),
        None => SqliteStore::open(),
    };

    match opened {
        Ok(store) => {
            log::debug!("Listing store at {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            log::warn!("Listing store unavailable, caching in memory only: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}
