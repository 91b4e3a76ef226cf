//! Listing store management commands

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::cache::{ContentListingCache, ListingLimits, SqliteStore, SystemClock};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::output::formatters::{format_size, format_timestamp_local};

/// Directory the listing store lives in for this configuration
fn store_dir(config: &Config) -> Result<PathBuf> {
    match &config.listing.storage_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(SqliteStore::cache_dir()?),
    }
}

/// Show store statistics
pub async fn status(opts: &GlobalOptions) -> Result<()> {
    let config = Config::load_at(opts.config_ref())?;
    let dir = store_dir(&config)?;
    let store = Arc::new(SqliteStore::open_at(&dir)?);
    let stats = store.stats()?;

    // Count what a fresh process would actually serve
    let listings = ContentListingCache::new(
        store.clone(),
        Arc::new(SystemClock),
        ListingLimits::from(&config.listing),
    );
    listings.hydrate().await;
    let live = listings.len();

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": store.path().display().to_string(),
                "stored_keys": stats.entries,
                "live_listings": live,
                "total_size_bytes": stats.total_size_bytes,
                "total_size_human": format_size(stats.total_size_bytes),
                "last_updated_timestamp": stats.last_updated,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            println!("{}", "Listing Store".bold());
            println!("────────────────────────────────────────");
            println!("Location:       {}", store.path().display());
            println!("Stored keys:    {}", stats.entries);
            println!("Live listings:  {}", live);
            println!("Total size:     {}", format_size(stats.total_size_bytes));

            if let Some(updated) = stats.last_updated {
                println!("Last updated:   {}", format_timestamp_local(updated));
            }
        }
    }

    Ok(())
}

/// Remove everything from the store
pub fn clear(opts: &GlobalOptions) -> Result<()> {
    let config = Config::load_at(opts.config_ref())?;
    let store = SqliteStore::open_at(&store_dir(&config)?)?;
    let cleared = store.clear_all()?;

    match opts.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "entries_removed": cleared.entries_removed,
                "success": true,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Pretty => {
            if cleared.entries_removed > 0 {
                println!("Cleared {} stored entries", cleared.entries_removed);
            } else {
                println!("Store was already empty");
            }
        }
    }

    Ok(())
}

/// Print the store directory
pub fn path(opts: &GlobalOptions) -> Result<()> {
    let config = Config::load_at(opts.config_ref())?;
    println!("{}", store_dir(&config)?.display());
    Ok(())
}
