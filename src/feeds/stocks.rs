//! Stock quote feed
//!
//! Quotes are cached per symbol under `stock_<SYMBOL>` for 12 hours.

use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{fetch_json, FeedError, DEFAULT_API_BASE_URL, STOCKS_CACHE_TTL};
use crate::cache::{cache_key, Clock, ExpiringCache, SystemClock};
use crate::storage::Storage;

/// Latest quote for one ticker symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    /// Human-readable time of the quote, as reported by the proxy
    #[serde(default)]
    pub last_updated: String,
    /// Quote time in milliseconds since the epoch
    #[serde(default)]
    pub timestamp: i64,
}

/// Formats a price as dollars with two decimals
pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

/// Cache key for a symbol; symbols are case-insensitive
pub fn quote_cache_key(symbol: &str) -> String {
    cache_key("stock", symbol.to_uppercase())
}

/// Client for stock quotes, backed by the expiring cache
#[derive(Debug)]
pub struct StockClient<'a, S, C = SystemClock> {
    http_client: Client,
    base_url: String,
    cache: &'a ExpiringCache<S, C>,
    ttl: Duration,
}

impl<'a, S: Storage, C: Clock> StockClient<'a, S, C> {
    /// Creates a client against the production proxy
    pub fn new(cache: &'a ExpiringCache<S, C>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            cache,
            ttl: STOCKS_CACHE_TTL,
        }
    }

    /// Points the client at a different proxy
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the freshness window
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the quote for `symbol`, from cache when fresh
    pub async fn quote(&self, symbol: &str) -> Result<StockQuote, FeedError> {
        let symbol = symbol.to_uppercase();
        let key = quote_cache_key(&symbol);

        if let Some(quote) = self.cache.get::<StockQuote>(&key, self.ttl) {
            debug!(%symbol, "stock quote served from cache");
            return Ok(quote);
        }

        let url = format!("{}/api/stock/quote", self.base_url);
        let quote: StockQuote =
            fetch_json(&self.http_client, &url, &[("symbol", symbol.as_str())]).await?;

        if let Err(e) = self.cache.set(&key, &quote) {
            warn!(%symbol, error = %e, "failed to cache stock quote");
        }
        Ok(quote)
    }

    /// Fetches several quotes concurrently, in the order given
    pub async fn quotes<T: AsRef<str>>(&self, symbols: &[T]) -> Vec<Result<StockQuote, FeedError>> {
        join_all(symbols.iter().map(|symbol| self.quote(symbol.as_ref()))).await
    }
}
