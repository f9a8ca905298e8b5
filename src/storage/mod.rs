//! Durable string-keyed storage medium
//!
//! The cache and the layout store never touch the filesystem directly; they
//! talk to a `Storage`, the same shape as browser local storage: synchronous
//! string keys mapped to string values. `FileStorage` keeps one file per key
//! on disk and `MemoryStorage` keeps everything for the current session only.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::rc::Rc;
use thiserror::Error;

/// Errors raised by a storage medium
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing files failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The medium cannot be used at all (e.g. disabled or no home directory)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Writing the value would exceed the medium's size limit
    #[error("Storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },
}

/// A synchronous string-keyed key-value medium
///
/// Every method takes `&self`: a medium is shared by several stores within
/// one session, and all access happens on a single thread.
pub trait Storage {
    /// Returns the value stored under `key`, or `None` if nothing is stored.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes the value under `key`. Deleting a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently present.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Deletes every key in the medium.
    fn clear(&self) -> Result<(), StorageError> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}

impl<T: Storage + ?Sized> Storage for Rc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

impl<T: Storage + ?Sized> Storage for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}
