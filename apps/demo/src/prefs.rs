//! Local durable preferences — the `did_rating_popup` latch and the first-open
//! timestamp.
//!
//! `FilePrefs` persists a flat JSON object and replaces it atomically on every
//! write; `MemoryPrefs` backs tests. Storage failures are logged and swallowed
//! like every other failure in this service.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::warn;

/// Durable local key-value storage, namespaced per install.
pub trait LocalPrefs: Send + Sync {
    fn get_bool(&self, key: &str, default: bool) -> bool;
    fn set_bool(&self, key: &str, value: bool);
    fn get_long(&self, key: &str, default: i64) -> i64;
    fn set_long(&self, key: &str, value: i64);
}

/// JSON-file-backed preferences.
pub struct FilePrefs {
    path: PathBuf,
    values: RwLock<HashMap<String, Value>>,
}

impl FilePrefs {
    /// Opens (or lazily creates) the preference file. An unreadable or corrupt
    /// file degrades to empty prefs rather than failing startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!("preference file {} is corrupt, starting empty: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    fn write_through(&self, values: &HashMap<String, Value>) {
        if let Err(e) = persist_atomically(&self.path, values) {
            warn!("preference write to {} dropped: {e}", self.path.display());
        }
    }

    fn set(&self, key: &str, value: Value) {
        let mut values = self.values.write().expect("prefs lock poisoned");
        values.insert(key.to_string(), value);
        self.write_through(&values);
    }
}

fn persist_atomically(path: &Path, values: &HashMap<String, Value>) -> anyhow::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    serde_json::to_writer_pretty(tmp.as_file(), values)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl LocalPrefs for FilePrefs {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let values = self.values.read().expect("prefs lock poisoned");
        values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set(key, Value::Bool(value));
    }

    fn get_long(&self, key: &str, default: i64) -> i64 {
        let values = self.values.read().expect("prefs lock poisoned");
        values.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    fn set_long(&self, key: &str, value: i64) {
        self.set(key, Value::from(value));
    }
}

/// In-memory preferences for tests.
#[derive(Default)]
#[allow(dead_code)]
pub struct MemoryPrefs {
    values: RwLock<HashMap<String, Value>>,
}

#[allow(dead_code)]
impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalPrefs for MemoryPrefs {
    fn get_bool(&self, key: &str, default: bool) -> bool {
        let values = self.values.read().expect("prefs lock poisoned");
        values.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    fn set_bool(&self, key: &str, value: bool) {
        let mut values = self.values.write().expect("prefs lock poisoned");
        values.insert(key.to_string(), Value::Bool(value));
    }

    fn get_long(&self, key: &str, default: i64) -> i64 {
        let values = self.values.read().expect("prefs lock poisoned");
        values.get(key).and_then(Value::as_i64).unwrap_or(default)
    }

    fn set_long(&self, key: &str, value: i64) {
        let mut values = self.values.write().expect("prefs lock poisoned");
        values.insert(key.to_string(), Value::from(value));
    }
}
