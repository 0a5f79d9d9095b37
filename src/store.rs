//! Persisted scalar preferences.
//!
//! The dashboard persists one string value per key (alert limits). A
//! [`PreferenceStore`] is anything that can get and set such values; the
//! terminal app uses [`JsonFileStore`], tests use [`MemoryStore`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while reading or writing preferences.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("preference file is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Key/value storage for user preferences.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store kept in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat JSON object on disk.
///
/// The whole file is rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// Memory only changes once the file has been written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.clone();
        values.insert(key.to_string(), value.to_string());
        self.write(&values)?;
        self.values = values;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("pulsar_threshold_CPU"), None);
        store.set("pulsar_threshold_CPU", "80").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("pulsar_threshold_CPU").as_deref(), Some("80"));
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("pulsar_threshold_CPU", "80").unwrap();

        // A directory in the file's place makes every write fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            store.set("pulsar_threshold_CPU", "20"),
            Err(StoreError::Io(_))
        ));
        assert!(store.set("pulsar_threshold_RAM", "4").is_err());
        assert_eq!(store.get("pulsar_threshold_CPU").as_deref(), Some("80"));
        assert_eq!(store.get("pulsar_threshold_RAM"), None);
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Encoding(_))
        ));
    }

    #[test]
    fn empty_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "").unwrap();
        assert!(JsonFileStore::open(&path).unwrap().get("x").is_none());
    }
}
