//! Durable key-value storage for broker state.
//!
//! The permission table and dapp visibility overrides are each kept under a
//! fixed key and always rewritten in full.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::debug;

use dappshell_core::{Error, Result};

/// Key-value store holding JSON documents.
pub trait KeyValueStore: Send + Sync {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the value stored under `key`.
    fn store(&self, key: &str, value: Value) -> Result<()>;
}

/// Store backed by a single JSON object on disk.
///
/// Every `store` call rewrites the whole document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file yields an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            match serde_json::from_str(&data)? {
                Value::Object(map) => map,
                _ => {
                    return Err(Error::Store(format!(
                        "{} does not hold a JSON object",
                        path.display()
                    )));
                }
            }
        } else {
            Map::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "Opened store");
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".into()))?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }
}

/// In-memory store, used when nothing should outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".into()))?
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Store that reads nothing and refuses every write.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FailingStore;

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn load(&self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn store(&self, _key: &str, _value: Value) -> Result<()> {
        Err(Error::Store("disk full".into()))
    }
}
