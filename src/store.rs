//! Local key-value persistence.
//!
//! [`load`] and [`save`] never fail: a missing key, corrupt JSON or an
//! unusable storage medium makes `load` return the fallback, and a failed
//! write is logged and reported as `false`.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// String values addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|err| StoreError::Unavailable {
            message: format!("cannot create '{}': {err}", self.dir.display()),
        })?;

        // Write beside the target and rename so a crash never leaves half a file.
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        let write_err = |source| StoreError::Write {
            key: key.to_string(),
            source,
        };
        fs::write(&staging, value).map_err(write_err)?;
        if let Err(source) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(write_err(source));
        }
        Ok(())
    }
}

/// In-process store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, bypassing serialization.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert_raw(key, value);
        Ok(())
    }
}

/// Stands for an environment with no storage medium at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable {
            message: "no storage medium in this context".to_string(),
        })
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable {
            message: "no storage medium in this context".to_string(),
        })
    }
}

/// Reads and decodes `key`, returning `fallback()` on any failure.
pub fn load<T, F>(store: &dyn KeyValueStore, key: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return fallback(),
        Err(err) => {
            warn!(key, error = %err, "error reading stored value; using initial value");
            return fallback();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "stored value is not valid JSON for this type; using initial value");
            fallback()
        }
    }
}

/// Encodes and writes `value` under `key`. Returns whether it was persisted.
pub fn save<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|json| {
            store.set(key, &json)?;
            Ok(json.len())
        });

    match result {
        Ok(bytes) => {
            debug!(key, bytes, "saved");
            true
        }
        Err(err) => {
            warn!(key, error = %err, "error writing stored value");
            false
        }
    }
}
