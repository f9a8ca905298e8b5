//! File-backed storage medium
//!
//! Stores each key as its own JSON file in an XDG-compliant data directory
//! (`~/.local/share/folio/` on Linux). Keys are percent-encoded into file
//! names so any string key maps to exactly one file and back.

use directories::ProjectDirs;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// Extension given to every stored value
const ITEM_EXTENSION: &str = "json";

/// Durable storage keeping one file per key
///
/// Reads always go to disk, so a value written through one `FileStorage`
/// is immediately visible through any other pointing at the same directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory holding the item files
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a FileStorage in the XDG data directory for `folio`
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "folio")?;
        Some(Self::with_dir(project_dirs.data_dir().to_path_buf()))
    }

    /// Creates a FileStorage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory the item files live in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the file holding `key`
    fn item_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_key(key), ITEM_EXTENSION))
    }

    /// Ensures the storage directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let path = self.item_path(key);

        // Write via temp file so a crash never leaves a half-written value
        let temp_path = path.with_extension(format!("{}.tmp", ITEM_EXTENSION));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ITEM_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            // Files we did not write are not ours to list
            if let Some(key) = decode_key(stem) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Returns true for bytes that may appear unescaped in a file name
fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-')
}

/// Percent-encodes a key into a portable file name stem
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for b in key.bytes() {
        if is_safe_byte(b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    encoded
}

/// Reverses `encode_key`; returns `None` for names it could not have produced
fn decode_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = stem.get(i + 1..i + 3)?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if is_safe_byte(b) => {
                decoded.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    let key = String::from_utf8(decoded).ok()?;
    // Lower-case escapes decode fine but `item_path` would never reach them
    (encode_key(&key) == stem).then_some(key)
}
