//! Small key/value store standing in for browser local storage.
//!
//! Native builds keep one file per key under the platform data directory;
//! wasm builds and tests use an in-memory map.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use std::io;
#[cfg(not(target_arch = "wasm32"))]
use std::{fs, path::PathBuf};

pub const API_KEY_KEY: &str = "geminiApiKey";
pub const USE_SPEECH_KEY: &str = "useSpeech";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================
// In-memory backend
// ============================================

static SHARED_MEMORY: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide store, used where no filesystem is available.
    pub fn shared() -> Self {
        Self {
            entries: SHARED_MEMORY.clone(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// ============================================
// File backend (native platforms)
// ============================================

#[cfg(not(target_arch = "wasm32"))]
pub struct FileStore {
    dir: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_local_dir>/sahayak/storage`, or `cache/storage` when the
    /// platform has no data directory.
    pub fn default_location() -> Self {
        let dir = dirs::data_local_dir()
            .map(|dir| dir.join("sahayak").join("storage"))
            .unwrap_or_else(|| PathBuf::from("cache").join("storage"));
        Self::new(dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", file_stem(key)))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

const MAX_FILE_STEM: usize = 64;

/// Maps a store key onto a file stem that cannot leave the store directory.
fn file_stem(key: &str) -> String {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_');
    key.chars()
        .map(|c| if allowed(c) { c } else { '_' })
        .take(MAX_FILE_STEM)
        .collect()
}

/// Platform default store.
pub fn default_store() -> Arc<dyn KeyValueStore> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        Arc::new(FileStore::default_location())
    }
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(MemoryStore::shared())
    }
}

// ============================================
// Typed accessors for the two persisted settings
// ============================================

pub fn load_api_key(store: &dyn KeyValueStore) -> Option<String> {
    store
        .get(API_KEY_KEY)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

pub fn save_api_key(store: &dyn KeyValueStore, key: &str) -> Result<(), StoreError> {
    store.set(API_KEY_KEY, key)
}

/// Reads the speech preference; anything other than a stored `false` means on.
pub fn load_use_speech(store: &dyn KeyValueStore) -> bool {
    !matches!(store.get(USE_SPEECH_KEY).as_deref().map(str::trim), Some("false"))
}

pub fn save_use_speech(store: &dyn KeyValueStore, enabled: bool) -> Result<(), StoreError> {
    store.set(USE_SPEECH_KEY, if enabled { "true" } else { "false" })
}
