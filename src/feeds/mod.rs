//! Cached data feeds for the dashboard widgets
//!
//! Each client checks the expiring cache first and only goes to the
//! portfolio API proxy on a miss, storing what it fetched for the next
//! reader. A failed cache write never fails the fetch.

pub mod sports;
pub mod stocks;

pub use sports::{Game, Score, SportType, SportsClient};
pub use stocks::{format_price, quote_cache_key, StockClient, StockQuote};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Production API proxy
pub const DEFAULT_API_BASE_URL: &str = "https://portfolio-nest-proxy.vercel.app";

/// Stock quotes stay usable for 12 hours
pub const STOCKS_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Scores go stale after 5 minutes
pub const SPORTS_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Errors that can occur when fetching feed data
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The proxy answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Sport name not recognized
    #[error("Invalid sport: '{0}'. Valid sports: mlb, nfl, nhl, nba")]
    UnknownSport(String),
}

/// GETs `url` with `query` and decodes the JSON body
async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, FeedError> {
    let response = client.get(url).query(query).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
