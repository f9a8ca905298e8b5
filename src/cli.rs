//! Command-line interface parsing for folio
//!
//! This module handles parsing of CLI arguments using clap. Global flags
//! choose where data lives and which API proxy to use; subcommands inspect
//! or change the widget layout and the response cache, or read the feeds.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;

use crate::feeds::{FeedError, SportType, DEFAULT_API_BASE_URL};
use crate::layout::{LayoutError, SizeCategory};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// A cache value that is not JSON
    #[error("Invalid JSON value: {0}")]
    InvalidJson(String),
}

/// folio - dashboard widget layout and response cache
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Portfolio dashboard widget layout and response cache")]
#[command(version)]
pub struct Cli {
    /// Directory holding persisted cache entries and layouts
    #[arg(long, global = true, env = "FOLIO_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the portfolio API proxy
    #[arg(long, global = true, env = "FOLIO_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show or change the widget layout
    #[command(subcommand)]
    Layout(LayoutCommand),

    /// Inspect or change cached responses
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Show stock quotes (cached for 12 hours)
    Stocks {
        /// Ticker symbols, e.g. AAPL MSFT
        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Show today's games, favourite team first (cached for 5 minutes)
    Sports {
        /// One of: mlb, nfl, nhl, nba
        sport: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LayoutCommand {
    /// Print the current layout
    Show {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Forget the saved layout and return to the default
    Reset,

    /// Resize a widget: small (1x2), medium (2x2) or large (3x4)
    Resize { id: String, size: String },

    /// Move a widget to a grid cell
    Move { id: String, x: u32, y: u32 },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Print a cached value if it is fresh
    Get {
        key: String,
        /// Maximum age in milliseconds; any age is accepted when omitted
        #[arg(long, value_name = "MS")]
        ttl_ms: Option<u64>,
    },

    /// Store a JSON value
    Set { key: String, value: String },

    /// Delete one entry
    Remove { key: String },

    /// Delete every cached entry (the layout is kept)
    Clear,

    /// List cached keys
    List,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Storage directory; `None` means the XDG default
    pub data_dir: Option<PathBuf>,
    /// API proxy base URL, without a trailing slash
    pub api_base_url: String,
    /// Most verbose level logged to stderr
    pub log_level: Level,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_level: Level::WARN,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - The parsed CLI struct
    ///
    /// # Returns
    /// * A StartupConfig with the API URL's trailing slash removed and the
    ///   log level raised to DEBUG when `--debug` was given
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            api_base_url: cli
                .api_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            log_level: if cli.debug { Level::DEBUG } else { Level::WARN },
        }
    }
}

/// Parses a size argument into a SizeCategory.
///
/// # Arguments
/// * `s` - The size name from CLI, e.g. `small` or `L`
///
/// # Returns
/// * `Ok(SizeCategory)` if the string names a size
/// * `Err(LayoutError::UnknownSize)` if it doesn't
pub fn parse_size_arg(s: &str) -> Result<SizeCategory, LayoutError> {
    s.parse()
}

/// Parses a sport argument into a SportType.
///
/// # Arguments
/// * `s` - The sport name from CLI, e.g. `nba`
///
/// # Returns
/// * `Ok(SportType)` if the string names a supported league
/// * `Err(FeedError::UnknownSport)` if it doesn't
pub fn parse_sport_arg(s: &str) -> Result<SportType, FeedError> {
    s.parse()
}

/// Parses a cache value argument as JSON.
pub fn parse_json_arg(s: &str) -> Result<serde_json::Value, CliError> {
    serde_json::from_str(s).map_err(|e| CliError::InvalidJson(e.to_string()))
}
