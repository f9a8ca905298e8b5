//! Expiring cache for API responses
//!
//! Widgets keep their last fetched data here so they can skip the network
//! while it is still fresh. Freshness is decided by the reader's TTL, and
//! stale entries are removed when a read finds them rather than by a timer.

mod clock;
mod expiring;

pub use clock::{Clock, ManualClock, SystemClock};
pub use expiring::{CacheError, CachedData, ExpiringCache, DEFAULT_NAMESPACE};

use std::fmt::Display;

/// Builds a key following the `<category>_<discriminator>` convention
///
/// ```
/// assert_eq!(folio::cache::cache_key("stock", "AAPL"), "stock_AAPL");
/// ```
pub fn cache_key(category: &str, discriminator: impl Display) -> String {
    format!("{}_{}", category, discriminator)
}
