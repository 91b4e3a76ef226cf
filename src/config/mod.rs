//! Configuration management for mediacache

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Resolution resolver settings
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Content listing cache settings
    #[serde(default)]
    pub listing: ListingConfig,

    /// Detail aggregate cache settings
    #[serde(default)]
    pub detail: DetailConfig,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Resolution resolver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// How long a probed resolution stays valid
    #[serde(default = "default_resolution_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_resolution_ttl_secs() -> u64 {
    30 * 60
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_resolution_ttl_secs(),
        }
    }
}

/// Content listing cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// How long a listing page stays valid
    #[serde(default = "default_listing_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of cached listing keys
    #[serde(default = "default_listing_max_entries")]
    pub max_entries: usize,

    /// Maximum number of rows kept per key
    #[serde(default = "default_listing_max_items")]
    pub max_items: usize,

    /// Quiet period before a burst of writes is persisted
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,

    /// Persist listings to disk at all
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Override the store directory (defaults to the XDG cache dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_listing_ttl_secs() -> u64 {
    30 * 60
}

fn default_listing_max_entries() -> usize {
    20
}

fn default_listing_max_items() -> usize {
    300
}

fn default_persist_debounce_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_listing_ttl_secs(),
            max_entries: default_listing_max_entries(),
            max_items: default_listing_max_items(),
            persist_debounce_ms: default_persist_debounce_ms(),
            persist: true,
            storage_dir: None,
        }
    }
}

/// Detail aggregate cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailConfig {
    #[serde(default = "default_detail_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_detail_max_entries")]
    pub max_entries: usize,
}

fn default_detail_ttl_secs() -> u64 {
    10 * 60
}

fn default_detail_max_entries() -> usize {
    20
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_detail_ttl_secs(),
            max_entries: default_detail_max_entries(),
        }
    }
}

/// Outbound HTTP settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side rate limit across all fetches
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_user_agent() -> String {
    format!("mediacache/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            user_agent: default_user_agent(),
        }
    }
}

impl ResolutionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl ListingConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}

impl DetailConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".mediacache").join("config.yaml"))
    }

    /// Resolve an optional override to a concrete path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional path; a missing file means defaults
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Reject settings the caches cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.listing.max_entries == 0 {
            return Err(ConfigError::Invalid("listing.max_entries must be > 0".to_string()).into());
        }
        if self.listing.max_items == 0 {
            return Err(ConfigError::Invalid("listing.max_items must be > 0".to_string()).into());
        }
        if self.detail.max_entries == 0 {
            return Err(ConfigError::Invalid("detail.max_entries must be > 0".to_string()).into());
        }
        if self.http.requests_per_second == 0 {
            return Err(
                ConfigError::Invalid("http.requests_per_second must be > 0".to_string()).into(),
            );
        }
        Ok(())
    }
}
