//! Command execution context
//!
//! Loads configuration and wires the fetcher and resolver once per
//! invocation. The listing store is left closed; only `cache` commands open it.

use std::sync::Arc;

use crate::cache::SystemClock;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{FetchText, HttpFetcher};
use crate::config::Config;
use crate::error::Result;
use crate::resolver::ResolutionResolver;

/// Shared state for network-facing commands
pub struct CommandContext {
    pub config: Config,
    pub fetcher: Arc<dyn FetchText>,
    pub resolver: ResolutionResolver,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config from `--config` (or the default location) and build the
    /// HTTP fetcher and resolver from it.
    ///
    /// # Errors
    /// Returns error if the config file is unreadable or invalid, or the HTTP
    /// client cannot be built.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::load_at(opts.config_ref())?;
        let fetcher: Arc<dyn FetchText> = Arc::new(HttpFetcher::new(&config.http)?);
        let resolver = ResolutionResolver::from_config(
            &config.resolution,
            Arc::clone(&fetcher),
            Arc::new(SystemClock),
        );

        Ok(Self {
            config,
            fetcher,
            resolver,
            format: opts.format,
        })
    }
}
