//! Persistence for naming options.
//!
//! Options live under a single fixed key in a small key-value store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use parking_lot::Mutex;

/// Key the naming options are stored under.
pub const NAMING_STORAGE_KEY: &str = "naming_options_v2";

/// Minimal key-value store for preference records.
pub trait NamingStore: Send + Sync {
    /// Raw stored value, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Replace the stored value.
    fn save(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Stores each key as `{dir}/{key}.json`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl NamingStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let temp_file = path.with_extension("json.tmp");
        fs::write(&temp_file, value)?;
        fs::rename(&temp_file, &path)?;
        tracing::debug!("Saved {} to {}", key, path.display());
        Ok(())
    }
}

/// In-memory store, for tests and hosts without a disk.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NamingStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
