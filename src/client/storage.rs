//! Key-value persistence for client state.
//!
//! The stores never touch a global; they hold an injected [`Storage`] so the
//! same code runs against memory in tests and files on disk in an app.

use crate::errors::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::warn;

/// String key-value store with `get` / `set` / `clear`.
pub trait Storage: Send + Sync {
    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removes `key`. Missing keys are not an error.
    fn clear(&self, key: &str) -> Result<()>;
}

/// Reads and decodes a JSON value. Missing or undecodable values read as `None`.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, "Discarding unreadable stored value: {e}");
            None
        }
    }
}

/// Encodes and stores a value as JSON.
pub fn save_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    storage.set(key, &serde_json::to_string(value)?)
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// One file per key under a directory. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding one file per key.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, value)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn exercise(storage: &dyn Storage) -> Result<()> {
        assert_eq!(storage.get("cartItems"), None);
        storage.set("cartItems", "[1,2]")?;
        assert_eq!(storage.get("cartItems").as_deref(), Some("[1,2]"));
        storage.set("cartItems", "[3]")?;
        assert_eq!(storage.get("cartItems").as_deref(), Some("[3]"));
        storage.clear("cartItems")?;
        assert_eq!(storage.get("cartItems"), None);
        // Clearing twice is fine
        storage.clear("cartItems")?;
        Ok(())
    }

    #[test]
    fn test_memory_storage() -> Result<()> {
        exercise(&MemoryStorage::new())
    }

    #[test]
    fn test_file_storage() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::new(dir.path().join("state"))?;
        exercise(&storage)?;

        // Values survive a new handle on the same directory
        storage.set("userInfo", "{}")?;
        let reopened = FileStorage::new(storage.dir())?;
        assert_eq!(reopened.get("userInfo").as_deref(), Some("{}"));
        Ok(())
    }

    #[test]
    fn test_load_json_ignores_garbage() -> Result<()> {
        let storage = MemoryStorage::new();
        storage.set("cartItems", "not json")?;
        assert_eq!(load_json::<Vec<i64>>(&storage, "cartItems"), None);

        save_json(&storage, "cartItems", &vec![1_i64, 2])?;
        assert_eq!(load_json::<Vec<i64>>(&storage, "cartItems"), Some(vec![1, 2]));
        Ok(())
    }
}
