//! Durable key-value storage for session and preference entries.
//!
//! [`FileStore`] keeps every entry in one JSON object file that is rewritten
//! atomically on each change. [`MemoryStore`] is the in-process equivalent.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

pub const ACCESS_TOKEN_KEY: &str = "google_access_token";
pub const REFRESH_TOKEN_KEY: &str = "google_refresh_token";
/// Milliseconds since the Unix epoch, as a decimal string.
pub const TOKEN_EXPIRY_KEY: &str = "google_token_expiry";
pub const USER_EMAIL_KEY: &str = "google_user_email";
pub const VIEW_KEY: &str = "calendar-view";
pub const THEME_KEY: &str = "calendar-theme";

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize storage: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Removes several keys at once.
    fn remove_all(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        lock(&self.entries).clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading existing entries.
    ///
    /// A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StorageError::Read {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| StorageError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            debug!("no storage file at {:?}", path);
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!("saved storage to {:?}", self.path);
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> StorageResult<()> {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() != before {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

/// Writes `content` to `path` through a temp file and rename, creating the
/// parent directory. The file is made owner-only on Unix.
pub fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    let write_err = |source: std::io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, content).map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        let _ = fs::set_permissions(path, perms);
    }

    Ok(())
}
