//! Persisted key-value storage.
//!
//! The console keeps a handful of string values across sessions: completion
//! markers, the serialized profile and the auth session. [`KeyValueStore`]
//! caches them in memory and delegates persistence to a [`StorageBackend`].
//!
//! ```text
//! KeyValueStore      cache + dirty flag, get/set/remove/flush
//!       │
//!       ▼
//! StorageBackend     MemoryStorage (tests, ephemeral)
//!                    FileStorage   (JSON file, write-temp-then-rename)
//! ```
//!
//! Storage failures never panic. Callers get a `Result` and the cache stays
//! usable, so the console keeps working for the rest of the session even if
//! the state file cannot be written.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage corruption: {0}")]
    Corruption(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub type Entries = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Where the key-value map lives between sessions.
pub trait StorageBackend: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Everything stored. An empty map on first run.
    fn load_all(&self) -> StorageResult<Entries>;

    /// Replace everything stored with `entries`.
    fn save_all(&self, entries: &Entries) -> StorageResult<()>;

    fn clear(&self) -> StorageResult<()>;

    fn is_available(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Memory storage
// ---------------------------------------------------------------------------

/// Ephemeral backend, used by tests and `--ephemeral` runs.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<Entries>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entries(entries: Entries) -> Self {
        Self {
            data: RwLock::new(entries),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load_all(&self) -> StorageResult<Entries> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_all(&self, entries: &Entries) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        *guard = entries.clone();
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?
            .clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("entries", &count)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

/// On-disk layout.
///
/// ```json
/// {
///   "format_version": 1,
///   "entries": {
///     "onboarding_completed": "true",
///     "userProfile": "{\"role\":\"developer\", ...}"
///   }
/// }
/// ```
#[derive(Serialize, Deserialize)]
struct StateFile {
    format_version: u32,
    entries: Entries,
}

impl StateFile {
    const FORMAT_VERSION: u32 = 1;
}

/// JSON file backend. Writes go to `{path}.tmp`, are synced, then renamed
/// over the real file.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// The file need not exist yet; it is created on first save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `$XDG_STATE_HOME/evalboard/state.json`, then `~/.local/state/...`,
    /// then the working directory.
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(state_dir().join("evalboard").join("state.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone();
        tmp.set_extension("json.tmp");
        tmp
    }
}

fn state_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("state");
    }
    PathBuf::from(".")
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &str {
        "FileStorage"
    }

    fn load_all(&self) -> StorageResult<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let state: StateFile = serde_json::from_reader(reader)
            .map_err(|e| StorageError::Corruption(format!("failed to parse state file: {e}")))?;
        if state.format_version != StateFile::FORMAT_VERSION {
            tracing::warn!(
                target: "evalboard.storage",
                stored = state.format_version,
                expected = StateFile::FORMAT_VERSION,
                "state file format version mismatch, ignoring stored state"
            );
            return Ok(Entries::new());
        }
        Ok(state.entries)
    }

    fn save_all(&self, entries: &Entries) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let state = StateFile {
            format_version: StateFile::FORMAT_VERSION,
            entries: entries.clone(),
        };

        let tmp_path = self.temp_path();
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer_pretty(&mut writer, &state)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(
            target: "evalboard.storage",
            path = %self.path.display(),
            entries = entries.len(),
            "saved state"
        );
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        let Some(parent) = self.path.parent() else {
            return false;
        };
        if parent.as_os_str().is_empty() {
            return true;
        }
        if !parent.exists() {
            return fs::create_dir_all(parent).is_ok();
        }
        let probe = parent.join(".evalboard_write_probe");
        if fs::write(&probe, b"probe").is_ok() {
            let _ = fs::remove_file(&probe);
            return true;
        }
        false
    }
}

impl fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Key-value store
// ---------------------------------------------------------------------------

/// Cached view over a backend.
///
/// Mutations mark the cache dirty; [`flush`](Self::flush) writes it out.
/// Shared as `Arc<KeyValueStore>` between the shell and its stores.
pub struct KeyValueStore {
    backend: Box<dyn StorageBackend>,
    cache: RwLock<Entries>,
    dirty: RwLock<bool>,
}

impl KeyValueStore {
    /// Does not read the backend; call [`load`](Self::load).
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(Entries::new()),
            dirty: RwLock::new(false),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    #[must_use]
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Replace the cache with what the backend holds.
    pub fn load(&self) -> StorageResult<usize> {
        let entries = self.backend.load_all()?;
        let count = entries.len();
        *self
            .cache
            .write()
            .map_err(|_| StorageError::Corruption("cache lock poisoned".into()))? = entries;
        self.set_dirty(false);
        tracing::debug!(target: "evalboard.storage", backend = %self.backend.name(), count, "loaded state");
        Ok(count)
    }

    /// Write the cache out if it changed. `Ok(true)` when something was written.
    pub fn flush(&self) -> StorageResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        let cache = self
            .cache
            .read()
            .map_err(|_| StorageError::Corruption("cache lock poisoned".into()))?;
        self.backend.save_all(&cache)?;
        drop(cache);
        self.set_dirty(false);
        Ok(true)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.read().ok()?.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.cache.read().map(|c| c.contains_key(key)).unwrap_or(false)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key.into(), value.into());
            drop(cache);
            self.set_dirty(true);
        }
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let removed = self.cache.write().ok()?.remove(key);
        if removed.is_some() {
            self.set_dirty(true);
        }
        removed
    }

    /// Clear both cache and backend.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.clear()?;
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        self.set_dirty(false);
        Ok(())
    }

    /// Read and deserialize a JSON value. Unparsable values read as `None`.
    #[must_use]
    pub fn get_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(target: "evalboard.storage", key, %error, "stored value is not valid JSON");
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: impl Into<String>, value: &T) -> StorageResult<()> {
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set(key, raw);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.read().map(|d| *d).unwrap_or(false)
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    fn set_dirty(&self, value: bool) {
        if let Ok(mut dirty) = self.dirty.write() {
            *dirty = value;
        }
    }
}

impl fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("backend", &self.backend.name())
            .field("entries", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
