//! Whole-document JSON storage.
//!
//! The knowledge base and the analytics record are small JSON documents that
//! are read fully and rewritten wholesale. There is no cross-process locking:
//! two processes writing the same file can lose updates. Anything stricter
//! needs per-key locking or a real data store behind this trait.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;

/// Load/save capability for one document type
pub trait JsonStore<T>: Send + Sync {
    fn load(&self) -> Result<T, StoreError>;
    fn save(&self, value: &T) -> Result<(), StoreError>;
}

/// Document backed by a pretty-printed JSON file
pub struct JsonFileStore<T> {
    path: PathBuf,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }
}

impl<T> JsonStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// A missing file reads as the default document.
    fn load(&self) -> Result<T, StoreError> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// In-memory document, used by tests and when no data dir is wanted
#[derive(Default)]
pub struct MemoryStore<T> {
    value: Mutex<T>,
}

impl<T> MemoryStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }
}

impl<T> JsonStore<T> for MemoryStore<T>
where
    T: Clone + Send,
{
    fn load(&self) -> Result<T, StoreError> {
        self.value
            .lock()
            .map(|v| v.clone())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        let mut guard = self
            .value
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *guard = value.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let store: JsonFileStore<KnowledgeBase> = JsonFileStore::new(dir.path().join("kb.json"));
        assert_eq!(store.load().unwrap(), KnowledgeBase::default());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("kb.json");
        let store: JsonFileStore<KnowledgeBase> = JsonFileStore::new(&path);
        store.save(&KnowledgeBase::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kb.json");
        fs::write(&path, "{not json").unwrap();
        let store: JsonFileStore<KnowledgeBase> = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new(vec![1, 2, 3]);
        store.save(&vec![4]).unwrap();
        assert_eq!(store.load().unwrap(), vec![4]);
    }
}
