use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::IndexError;

/// Blob storage for a persisted index.
///
/// An index is written as a couple of named blobs (`index.bin`,
/// `manifest.json`); stores only need to move bytes.
pub trait IndexStore: Send + Sync {
    /// Insert or replace a blob.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError>;
    /// Fetch a blob, `None` when it was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError>;
    /// Human-readable location used in logs and `NotFound` errors.
    fn location(&self) -> String;
}

/// Configuration for selecting and building a store.
///
/// ```
/// use index::StoreConfig;
///
/// let on_disk = StoreConfig::directory("iso17025_index");
/// let ephemeral = StoreConfig::in_memory();
/// # let _ = (on_disk, ephemeral);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// One directory holding `index.bin` and `manifest.json`.
    Directory { path: PathBuf },
    /// Process-local map, for tests.
    InMemory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::directory("iso17025_index")
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        StoreConfig::InMemory
    }

    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        StoreConfig::Directory { path: path.into() }
    }

    pub fn build(&self) -> Result<Box<dyn IndexStore>, IndexError> {
        match self {
            StoreConfig::InMemory => Ok(Box::new(InMemoryStore::new())),
            StoreConfig::Directory { path } => Ok(Box::new(DirectoryStore::new(path))),
        }
    }
}

/// Files in a directory. The directory is created on first write.
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl IndexStore for DirectoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        fs::create_dir_all(&self.root)?;
        let target = self.root.join(key);
        // readers never observe a half-written file
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        match fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}

/// An in-memory store using a `RwLock` around a `HashMap`.
#[derive(Default)]
pub struct InMemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexStore for InMemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        self.blobs
            .write()
            .map_err(|_| IndexError::Store("poisoned lock".into()))?
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let guard = self
            .blobs
            .read()
            .map_err(|_| IndexError::Store("poisoned lock".into()))?;
        Ok(guard.get(key).cloned())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}
