//! Best-effort cache of the last seen applies count per subject.
//!
//! Writes never fail the caller: errors are logged and the value is lost.
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use applies_core::CacheEntry;
use applies_logging::{applies_debug, applies_error, applies_warn, ExecContext};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const CACHE_FILENAME: &str = "applies_cache.ron";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cache directory missing or not writable: {0}")]
    CacheDir(String),
    #[error("cache encoding error: {0}")]
    Encoding(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Injected persistence capability for cache records.
pub trait CacheStore: Send + Sync {
    /// Last write wins.
    fn put(&self, key: &str, entry: &CacheEntry);
    fn get(&self, key: &str) -> Option<CacheEntry>;
    /// All records, ordered by key.
    fn entries(&self) -> Vec<(String, CacheEntry)>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn put(&self, key: &str, entry: &CacheEntry) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry.clone());
    }

    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn entries(&self) -> Vec<(String, CacheEntry)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }
}

/// Ensure the cache directory exists; create if missing.
pub fn ensure_cache_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::CacheDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::CacheDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::CacheDir(e.to_string()))?;
    }
    Ok(())
}

/// All records in one RON file, rewritten atomically on every put.
#[derive(Debug)]
pub struct RonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl RonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILENAME)
    }

    /// Missing file reads as empty.
    pub fn load(&self) -> Result<BTreeMap<String, CacheEntry>, PersistError> {
        let content = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        ron::from_str(&content).map_err(|err| PersistError::Encoding(err.to_string()))
    }

    pub fn try_put(&self, key: &str, entry: &CacheEntry) -> Result<(), PersistError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = match self.load() {
            Ok(records) => records,
            Err(PersistError::Encoding(err)) => {
                applies_warn!("discarding unreadable cache {:?}: {}", self.path(), err);
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        records.insert(key.to_string(), entry.clone());
        let content = ron::ser::to_string_pretty(&records, ron::ser::PrettyConfig::new())
            .map_err(|err| PersistError::Encoding(err.to_string()))?;
        self.write_atomic(&content)
    }

    fn write_atomic(&self, content: &str) -> Result<(), PersistError> {
        ensure_cache_dir(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(self.path()).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}

impl CacheStore for RonFileStore {
    fn put(&self, key: &str, entry: &CacheEntry) {
        match self.try_put(key, entry) {
            Ok(()) => applies_debug!(ctx = ExecContext::Content; "cached {} = {}", key, entry.applies),
            Err(err) => applies_error!(ctx = ExecContext::Content; "failed to cache {}: {}", key, err),
        }
    }

    fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.load() {
            Ok(mut records) => records.remove(key),
            Err(err) => {
                applies_warn!("failed to read cache {:?}: {}", self.path(), err);
                None
            }
        }
    }

    fn entries(&self) -> Vec<(String, CacheEntry)> {
        match self.load() {
            Ok(records) => records.into_iter().collect(),
            Err(err) => {
                applies_warn!("failed to read cache {:?}: {}", self.path(), err);
                Vec::new()
            }
        }
    }
}
