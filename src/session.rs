//! Per-process store ownership
//!
//! A `Session` is built once at startup and handed to whatever needs the
//! cache or the layout store. Both stores share one storage medium.

use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, warn};

use crate::cache::ExpiringCache;
use crate::layout::LayoutStore;
use crate::storage::{FileStorage, MemoryStorage, Storage};

/// Storage handle shared by the stores of a session
pub type SharedStorage = Rc<dyn Storage>;

/// The cache and layout store for one run of the application
pub struct Session {
    storage: SharedStorage,
    pub cache: ExpiringCache<SharedStorage>,
    pub layouts: LayoutStore<SharedStorage>,
}

impl Session {
    /// Opens file storage in `data_dir`, or the XDG data directory if `None`
    ///
    /// When no directory can be determined the session still works, but
    /// nothing outlives the process.
    pub fn open(data_dir: Option<PathBuf>) -> Self {
        let file_storage = data_dir.map(FileStorage::with_dir).or_else(FileStorage::new);
        Self::with_storage(shared_storage(file_storage))
    }

    /// Builds a session over an existing medium
    pub fn with_storage(storage: SharedStorage) -> Self {
        Self {
            cache: ExpiringCache::new(Rc::clone(&storage)),
            layouts: LayoutStore::new(Rc::clone(&storage)),
            storage,
        }
    }

    /// The medium both stores write to
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }
}

/// Uses the file medium when there is one, otherwise session-only memory
fn shared_storage(file_storage: Option<FileStorage>) -> SharedStorage {
    match file_storage {
        Some(file_storage) => {
            info!(dir = %file_storage.dir().display(), "using file storage");
            Rc::new(file_storage)
        }
        None => {
            warn!("no data directory available, cache and layout will not persist");
            Rc::new(MemoryStorage::new())
        }
    }
}
