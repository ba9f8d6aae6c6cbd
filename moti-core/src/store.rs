//! Favorites and search history persistence.
//!
//! Everything here is best-effort: decode and write failures are logged and
//! swallowed, so callers always get a usable (possibly empty) value back.

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use crate::{error::StoreError, model::HistoryEntry};

pub const FAVORITES_KEY: &str = "favorites";
pub const HISTORY_KEY: &str = "history";
/// History entries kept on write.
pub const HISTORY_LIMIT: usize = 10;

/// String-keyed string slots.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Process-local slots, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.slots().remove(key);
        Ok(())
    }
}

/// Owns the favorites and history lists.
#[derive(Debug)]
pub struct Store {
    kv: Box<dyn KeyValueStore>,
    // serializes read-modify-write sequences
    write_lock: Mutex<()>,
}

impl Store {
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self { kv: Box::new(kv), write_lock: Mutex::new(()) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn load_favorites(&self) -> Vec<String> {
        self.load_list(FAVORITES_KEY)
    }

    pub fn save_favorites(&self, favorites: &[String]) {
        self.save_list(FAVORITES_KEY, favorites);
    }

    pub fn add_favorite(&self, city: &str) {
        let _guard = self.lock();
        let mut favorites = self.load_favorites();
        if !favorites.iter().any(|f| f == city) {
            favorites.push(city.to_string());
            self.save_favorites(&favorites);
        }
    }

    pub fn remove_favorite(&self, city: &str) {
        let _guard = self.lock();
        let mut favorites = self.load_favorites();
        favorites.retain(|f| f != city);
        self.save_favorites(&favorites);
    }

    pub fn load_history(&self) -> Vec<HistoryEntry> {
        self.load_list(HISTORY_KEY)
    }

    /// Writes at most the first [`HISTORY_LIMIT`] entries; callers order
    /// most-recent-first.
    pub fn save_history(&self, history: &[HistoryEntry]) {
        let limited = &history[..history.len().min(HISTORY_LIMIT)];
        self.save_list(HISTORY_KEY, limited);
    }

    /// Move (or insert) `city` to the front of the history with a fresh timestamp.
    pub fn add_to_history(&self, city: &str) {
        let _guard = self.lock();
        let mut history = self.load_history();
        history.retain(|entry| entry.city != city);
        history.insert(
            0,
            HistoryEntry { city: city.to_string(), timestamp: Utc::now().timestamp_millis() },
        );
        self.save_history(&history);
    }

    pub fn clear_history(&self) {
        let _guard = self.lock();
        if let Err(e) = self.kv.remove(HISTORY_KEY) {
            tracing::warn!(error = %e, "Failed to clear search history");
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.kv.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read stored list");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(key, error = %StoreError::from(e), "Discarding corrupt stored list");
                Vec::new()
            }
        }
    }

    fn save_list<T: Serialize>(&self, key: &str, list: &[T]) {
        let result = serde_json::to_string(list)
            .map_err(StoreError::from)
            .and_then(|json| self.kv.set(key, &json));

        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Failed to save list");
        }
    }
}
