//! Persistent storage for the filtered-command set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;

/// Durable home of the filtered-command set, read at activation and written
/// on every mutation.
pub trait FilterStore: Send + Sync {
    /// Read the persisted set. A store that has never been written is empty.
    fn load(&self) -> Result<HashSet<String>, StoreError>;

    /// Replace the persisted set.
    fn save(&self, commands: &HashSet<String>) -> Result<(), StoreError>;
}

/// Stores the set as a sorted JSON array in a single file.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write never leaves a truncated store behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl FilterStore for JsonFileStore {
    fn load(&self) -> Result<HashSet<String>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if content.trim().is_empty() {
            return Ok(HashSet::new());
        }
        let list: Vec<String> =
            serde_json::from_str(&content).map_err(|source| StoreError::Decode {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(list.into_iter().collect())
    }

    fn save(&self, commands: &HashSet<String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let mut sorted: Vec<&String> = commands.iter().collect();
        sorted.sort();
        let body = serde_json::to_string_pretty(&sorted).map_err(|source| StoreError::Decode {
            path: self.path.display().to_string(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

/// In-process store. Used by tests and by embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    commands: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_commands<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: Mutex::new(commands.into_iter().map(Into::into).collect()),
        }
    }
}

impl FilterStore for MemoryStore {
    fn load(&self) -> Result<HashSet<String>, StoreError> {
        let guard = self.commands.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, commands: &HashSet<String>) -> Result<(), StoreError> {
        let mut guard = self.commands.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = commands.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/filtered.json"));
        let set: HashSet<String> = ["deploy", "restart"].iter().map(|s| s.to_string()).collect();
        store.save(&set).unwrap();
        assert_eq!(store.load().unwrap(), set);
        assert!(!dir.path().join("nested/filtered.json.tmp").exists());
    }

    #[test]
    fn file_is_sorted_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.json");
        let store = JsonFileStore::new(&path);
        let set: HashSet<String> = ["zeta", "alpha"].iter().map(|s| s.to_string()).collect();
        store.save(&set).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec!["alpha", "zeta"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::with_commands(["a"]);
        let mut set = store.load().unwrap();
        set.insert("b".into());
        store.save(&set).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }
}
