//! Persisted key/value state.
//!
//! The engine never touches storage ambiently: a [`StateStore`] is opened
//! once at start-up and handed to the selection and the ad draft. Values are
//! JSON so that preferences round-trip verbatim.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub trait StateStore: Send + Sync {
    fn get_value(&self, key: &str) -> Option<Value>;
    fn put_value(&self, key: &str, value: Value) -> anyhow::Result<()>;
}

impl dyn StateStore {
    /// Typed read. A missing key or a value of the wrong shape yields `default`.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let Some(value) = self.get_value(key) else {
            return default;
        };
        match serde_json::from_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!("[store] ignoring undecodable value for {:?}: {}", key, e);
                default
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        self.put_value(key, value)
    }
}

/// One JSON object on disk, rewritten atomically on every put.
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open `path`. A missing file starts empty; so does a corrupt one, with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => {
                    debug!("[store] loaded {} keys from {}", map.len(), path.display());
                    map
                }
                Err(e) => {
                    warn!("[store] {} is corrupt, starting empty: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!("[store] cannot read {}: {}", path.display(), e);
                Map::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn values(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_snapshot(&self, snapshot: &Map<String, Value>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.values().get(key).cloned()
    }

    fn put_value(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let mut values = self.values();
        values.insert(key.to_string(), value);
        self.write_snapshot(&values)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get_value(&self, key: &str) -> Option<Value> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.get(key).cloned()
    }

    fn put_value(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn missing_file_opens_empty_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("state.json");
        let store: Arc<dyn StateStore> = Arc::new(JsonFileStore::open(&path));
        assert_eq!(store.load("cpm", 0.1_f64), 0.1);

        store.save("cpm", &0.25_f64).unwrap();
        store.save("channels", &vec!["a", "b"]).unwrap();

        let reopened: Arc<dyn StateStore> = Arc::new(JsonFileStore::open(&path));
        assert_eq!(reopened.load("cpm", 0.0_f64), 0.25);
        assert_eq!(
            reopened.load::<Vec<String>>("channels", Vec::new()),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonFileStore::open(&path);
        assert!(store.get_value("channels").is_none());
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        store.save("active", "yes").unwrap();
        assert!(!store.load("active", false));
    }
}
