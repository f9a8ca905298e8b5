//! Expiring cache over a storage medium
//!
//! Entries are stored with the time they were written. The freshness window
//! is chosen by each reader, so a 5 minute reader and a 12 hour reader can
//! share one stored entry and disagree on whether it is still usable.
//! Expired and unreadable entries are deleted when a read finds them.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::clock::{duration_millis, millis_to_datetime, Clock, SystemClock};
use crate::storage::{Storage, StorageError};

/// Prefix given to every key the cache writes
pub const DEFAULT_NAMESPACE: &str = "cache.";

/// Errors from writing to or clearing the cache
///
/// Misses and expiry are not errors; they show up as `None` from `get`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The value could not be serialized to JSON
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The storage medium rejected the operation
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Envelope persisted for every entry
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry<T> {
    /// The cached payload
    value: T,
    /// Milliseconds since the epoch at write time
    stored_at: i64,
}

/// A fresh cache hit along with when it was written
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was written
    pub stored_at: DateTime<Utc>,
    /// How old the data was at read time
    pub age: Duration,
}

/// Key-value cache whose entries expire relative to a reader-supplied TTL
///
/// The cache holds no state of its own beyond its configuration: every
/// operation goes straight to the storage medium, so a `get` right after a
/// `set` always sees the new value.
#[derive(Debug, Clone)]
pub struct ExpiringCache<S, C = SystemClock> {
    storage: S,
    clock: C,
    namespace: String,
}

impl<S: Storage> ExpiringCache<S> {
    /// Creates a cache over `storage` using wall-clock time
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> ExpiringCache<S, C> {
    /// Creates a cache with a custom time source
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Replaces the key prefix
    ///
    /// An empty namespace makes `clear` wipe the whole medium.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The key prefix this cache owns
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Stores `value` under `key`, stamped with the current time
    ///
    /// Overwrites any previous entry for `key`. Callers should treat an
    /// error as non-fatal: the data they just fetched is still good.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now_millis(),
        };
        let json = serde_json::to_string(&entry)?;
        self.storage.set_item(&self.storage_key(key), &json)?;
        debug!(key, "cache entry stored");
        Ok(())
    }

    /// Returns the value under `key` if it is at most `ttl` old
    ///
    /// Returns `None` when the key was never written, was removed, has
    /// expired, or cannot be read. Expired and corrupt entries are deleted.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        self.entry(key, ttl).map(|cached| cached.data)
    }

    /// Like `get`, but also reports when the entry was written
    pub fn entry<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<CachedData<T>> {
        let storage_key = self.storage_key(key);

        let raw = match self.storage.get_item(&storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                self.evict(&storage_key);
                return None;
            }
        };

        // A negative age means the clock moved back; the entry counts as fresh
        let age_ms = self.clock.now_millis().saturating_sub(entry.stored_at);
        if age_ms > duration_millis(ttl) {
            debug!(key, age_ms, "cache entry expired");
            self.evict(&storage_key);
            return None;
        }

        // The envelope is sound, so another reader may still want this entry
        match serde_json::from_value(entry.value) {
            Ok(data) => Some(CachedData {
                data,
                stored_at: millis_to_datetime(entry.stored_at),
                age: Duration::from_millis(age_ms.max(0) as u64),
            }),
            Err(e) => {
                warn!(key, error = %e, "cached value has an unexpected shape");
                None
            }
        }
    }

    /// Returns the fresh value under `key`, or computes, stores and returns a new one
    ///
    /// A failure to store the computed value is logged and otherwise ignored.
    pub fn get_or_insert_with<T, E, F>(&self, key: &str, ttl: Duration, f: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get(key, ttl) {
            return Ok(hit);
        }

        let value = f()?;
        if let Err(e) = self.set(key, &value) {
            warn!(key, error = %e, "failed to cache computed value");
        }
        Ok(value)
    }

    /// Deletes the entry under `key`; does nothing if there is none
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove_item(&self.storage_key(key))?;
        Ok(())
    }

    /// Deletes every entry in this cache's namespace
    ///
    /// Keys outside the namespace are left alone.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut removed = 0usize;
        for key in self.storage.keys()? {
            if key.starts_with(&self.namespace) {
                self.storage.remove_item(&key)?;
                removed += 1;
            }
        }
        debug!(removed, "cache cleared");
        Ok(())
    }

    /// Lists the keys currently stored in this cache, fresh or not
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .storage
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.namespace).map(str::to_string))
            .collect())
    }

    fn evict(&self, storage_key: &str) {
        if let Err(e) = self.storage.remove_item(storage_key) {
            warn!(key = storage_key, error = %e, "failed to evict cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::storage::MemoryStorage;
    use std::convert::Infallible;

    const TWELVE_HOURS: Duration = Duration::from_millis(43_200_000);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Quote {
        price: f64,
    }

    fn create_test_cache(storage: &MemoryStorage) -> (ExpiringCache<&MemoryStorage, ManualClock>, ManualClock) {
        let clock = ManualClock::at(0);
        let cache = ExpiringCache::with_clock(storage, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_get_right_after_set_returns_value() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);
        let quote = Quote { price: 178.72 };

        cache.set("stock_AAPL", &quote).unwrap();

        assert_eq!(cache.get::<Quote>("stock_AAPL", TWELVE_HOURS), Some(quote));
    }

    #[test]
    fn test_fresh_entry_within_ttl() {
        let storage = MemoryStorage::new();
        let (cache, clock) = create_test_cache(&storage);
        cache.set("stock_AAPL", &Quote { price: 178.72 }).unwrap();

        clock.set(1_000);

        let hit = cache.get::<Quote>("stock_AAPL", TWELVE_HOURS);
        assert_eq!(hit, Some(Quote { price: 178.72 }));
    }

    #[test]
    fn test_age_equal_to_ttl_is_still_fresh() {
        let storage = MemoryStorage::new();
        let (cache, clock) = create_test_cache(&storage);
        cache.set("stock_AAPL", &Quote { price: 1.0 }).unwrap();

        clock.set(43_200_000);

        assert!(cache.get::<Quote>("stock_AAPL", TWELVE_HOURS).is_some());
    }

    #[test]
    fn test_clock_moved_back_counts_as_fresh() {
        let storage = MemoryStorage::new();
        let (cache, clock) = create_test_cache(&storage);
        clock.set(10_000);
        cache.set("sports_nba", &7).unwrap();

        clock.set(0);

        let hit = cache
            .entry::<i32>("sports_nba", Duration::from_millis(1))
            .expect("entry from the future should be fresh");
        assert_eq!(hit.data, 7);
        assert_eq!(hit.age, Duration::ZERO);
        assert_eq!(hit.stored_at.timestamp_millis(), 10_000);
    }

    #[test]
    fn test_expired_entry_is_evicted_not_masked() {
        let storage = MemoryStorage::new();
        let (cache, clock) = create_test_cache(&storage);
        cache.set("stock_AAPL", &Quote { price: 178.72 }).unwrap();

        clock.set(43_200_001);
        assert!(cache.get::<Quote>("stock_AAPL", TWELVE_HOURS).is_none());
        assert!(storage.get_item("cache.stock_AAPL").unwrap().is_none());

        // A longer window cannot bring it back
        clock.set(43_200_002);
        assert!(cache.get::<Quote>("stock_AAPL", Duration::MAX).is_none());
    }

    #[test]
    fn test_readers_choose_their_own_ttl() {
        let storage = MemoryStorage::new();
        let (cache, clock) = create_test_cache(&storage);
        cache.set("scores", &vec![1, 2, 3]).unwrap();

        clock.advance(Duration::from_secs(10 * 60));

        // Long-window reader still sees it, and reading does not refresh it
        assert!(cache.get::<Vec<i32>>("scores", TWELVE_HOURS).is_some());
        assert!(cache.get::<Vec<i32>>("scores", Duration::from_secs(5 * 60)).is_none());
        assert!(cache.get::<Vec<i32>>("scores", TWELVE_HOURS).is_none());
    }

    #[test]
    fn test_never_written_key_is_none() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);

        assert!(cache.get::<Quote>("stock_MSFT", Duration::ZERO).is_none());
        assert!(cache.get::<Quote>("stock_MSFT", Duration::MAX).is_none());
    }

    #[test]
    fn test_removed_key_is_none() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);
        cache.set("stock_TSLA", &Quote { price: 177.29 }).unwrap();

        cache.remove("stock_TSLA").unwrap();
        cache.remove("stock_TSLA").unwrap();

        assert!(cache.get::<Quote>("stock_TSLA", TWELVE_HOURS).is_none());
    }

    #[test]
    fn test_overwrite_resets_stored_at() {
        let storage = MemoryStorage::new();
        let (cache, clock) = create_test_cache(&storage);
        cache.set("k", &1).unwrap();

        clock.set(5_000);
        cache.set("k", &2).unwrap();
        clock.set(6_000);

        let hit = cache.entry::<i32>("k", Duration::from_millis(1_000)).unwrap();
        assert_eq!(hit.data, 2);
        assert_eq!(hit.stored_at.timestamp_millis(), 5_000);
        assert_eq!(hit.age, Duration::from_millis(1_000));
    }

    #[test]
    fn test_clear_only_touches_namespace_and_is_idempotent() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);
        storage.set_item("widget-layouts", "[]").unwrap();
        cache.set("stock_AAPL", &1).unwrap();
        cache.set("sports_nba", &2).unwrap();

        cache.clear().unwrap();
        assert!(cache.keys().unwrap().is_empty());

        cache.clear().unwrap();
        assert!(cache.keys().unwrap().is_empty());
        assert_eq!(storage.get_item("widget-layouts").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_empty_namespace_clears_everything() {
        let storage = MemoryStorage::new();
        let cache = ExpiringCache::new(&storage).with_namespace("");
        storage.set_item("unrelated", "x").unwrap();
        cache.set("k", &1).unwrap();

        cache.clear().unwrap();

        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_entry_is_treated_as_miss_and_removed() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);
        storage.set_item("cache.stock_AAPL", "{not json").unwrap();

        assert!(cache.get::<Quote>("stock_AAPL", TWELVE_HOURS).is_none());
        assert!(storage.get_item("cache.stock_AAPL").unwrap().is_none());
    }

    #[test]
    fn test_shape_mismatch_is_miss_but_entry_kept() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);
        cache.set("stock_AAPL", &Quote { price: 1.0 }).unwrap();

        assert!(cache.get::<Vec<String>>("stock_AAPL", TWELVE_HOURS).is_none());
        assert!(cache.get::<Quote>("stock_AAPL", TWELVE_HOURS).is_some());
    }

    #[test]
    fn test_disabled_storage_reads_as_miss_and_write_errors() {
        let storage = MemoryStorage::disabled();
        let (cache, _clock) = create_test_cache(&storage);

        assert!(matches!(
            cache.set("k", &1),
            Err(CacheError::Storage(StorageError::Unavailable(_)))
        ));
        assert!(cache.get::<i32>("k", TWELVE_HOURS).is_none());
    }

    #[test]
    fn test_quota_exceeded_surfaces_on_set() {
        let storage = MemoryStorage::with_quota(16);
        let (cache, _clock) = create_test_cache(&storage);

        let result = cache.set("big", &"x".repeat(64));
        assert!(matches!(
            result,
            Err(CacheError::Storage(StorageError::QuotaExceeded { .. }))
        ));
    }

    #[test]
    fn test_entry_envelope_uses_camel_case() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at(42);
        let cache = ExpiringCache::with_clock(&storage, clock);
        cache.set("k", &true).unwrap();

        let raw = storage.get_item("cache.k").unwrap().unwrap();
        assert_eq!(raw, r#"{"value":true,"storedAt":42}"#);
    }

    #[test]
    fn test_get_or_insert_with_computes_once() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);
        let mut calls = 0;

        let first: Result<i32, Infallible> = cache.get_or_insert_with("n", TWELVE_HOURS, || {
            calls += 1;
            Ok(7)
        });
        let second: Result<i32, Infallible> = cache.get_or_insert_with("n", TWELVE_HOURS, || {
            calls += 1;
            Ok(8)
        });

        assert_eq!(first.unwrap(), 7);
        assert_eq!(second.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_get_or_insert_with_does_not_store_errors() {
        let storage = MemoryStorage::new();
        let (cache, _clock) = create_test_cache(&storage);

        let result: Result<i32, &str> = cache.get_or_insert_with("n", TWELVE_HOURS, || Err("offline"));

        assert_eq!(result, Err("offline"));
        assert!(cache.keys().unwrap().is_empty());
    }

    #[test]
    fn test_get_or_insert_with_survives_write_failure() {
        let storage = MemoryStorage::disabled();
        let (cache, _clock) = create_test_cache(&storage);

        let result: Result<i32, Infallible> = cache.get_or_insert_with("n", TWELVE_HOURS, || Ok(3));

        assert_eq!(result.unwrap(), 3);
    }
}
