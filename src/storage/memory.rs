//! In-memory storage medium
//!
//! Used when no durable location is available, and by tests. Can simulate a
//! size quota and a fully disabled medium (as in browser privacy mode).

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{Storage, StorageError};

/// Session-only key-value storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<BTreeMap<String, String>>,
    /// Maximum total size of keys plus values, in bytes
    quota: Option<usize>,
    /// When set, every operation fails with `StorageError::Unavailable`
    disabled: bool,
}

impl MemoryStorage {
    /// Creates an empty, unlimited storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage that rejects writes beyond `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Creates a storage where every operation fails
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn check_enabled(&self) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable(
                "storage is disabled".to_string(),
            ));
        }
        Ok(())
    }

    /// Bytes used by everything except `key`
    fn used_without(&self, key: &str) -> usize {
        self.items
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_enabled()?;

        if let Some(limit) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_enabled()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_enabled()?;
        Ok(self.items.borrow().keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.check_enabled()?;
        self.items.borrow_mut().clear();
        Ok(())
    }
}
