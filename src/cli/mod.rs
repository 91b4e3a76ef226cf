//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod cache;
pub mod channels;
pub mod context;
pub mod resolution;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// Default number of playlists probed at once by `resolution`
pub const DEFAULT_CONCURRENCY: usize = 4;

/// mediacache - playlist probing and metadata caches for media browsing
#[derive(Parser, Debug)]
#[command(name = "mediacache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, json)
    #[arg(
        long,
        global = true,
        env = "MEDIACACHE_FORMAT",
        default_value = "pretty",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "MEDIACACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "MEDIACACHE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the channels of an M3U playlist
    Channels {
        /// Playlist URL
        url: String,
    },

    /// Probe stream URLs for their best resolution
    Resolution {
        /// One or more stream URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum number of playlists fetched at once
        #[arg(long, short = 'j', default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Manage the persisted listing store
    #[command(subcommand)]
    Cache(CacheCommands),
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show store statistics
    Status,
    /// Remove all persisted data
    Clear,
    /// Print the store directory
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolution_defaults() {
        let cli = Cli::parse_from(["mediacache", "resolution", "http://x/a.m3u8"]);

        match cli.command {
            Commands::Resolution { urls, concurrency } => {
                assert_eq!(urls, vec!["http://x/a.m3u8"]);
                assert_eq!(concurrency, DEFAULT_CONCURRENCY);
            }
            _ => panic!("Expected Commands::Resolution"),
        }
        assert_eq!(cli.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "mediacache",
            "cache",
            "status",
            "--format",
            "json",
            "--config",
            "/tmp/mc.yaml",
        ]);

        assert!(matches!(cli.command, Commands::Cache(CacheCommands::Status)));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config.as_deref(), Some("/tmp/mc.yaml"));
    }

    #[test]
    fn test_resolution_requires_url() {
        assert!(Cli::try_parse_from(["mediacache", "resolution"]).is_err());
    }
}
