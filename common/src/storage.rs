// common/src/storage.rs
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Opaque bearer token
pub const TOKEN_KEY: &str = "token";
/// JSON-serialized [`User`](crate::User)
pub const USER_KEY: &str = "user";
/// `"true"` / `"false"`
pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key/value storage for session identity, modeled on `localStorage`
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let storage = Self::new();
        for (key, value) in items {
            storage.items.insert(key.into(), value.into());
        }
        storage
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|entry| entry.value().clone())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// JSON-file storage. Every write rewrites the whole file before returning.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: DashMap<String, String>,
    // Serializes snapshot + rename so concurrent writers cannot reorder on disk
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = DashMap::new();

        match fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => {
                let map: BTreeMap<String, String> = serde_json::from_str(&contents)
                    .map_err(|source| StorageError::Corrupt { path: path.clone(), source })?;
                for (key, value) in map {
                    items.insert(key, value);
                }
            },
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No storage file at {}, starting empty", path.display());
            },
            Err(source) => return Err(StorageError::Io { path, source }),
        }

        Ok(Self {
            path,
            items,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let snapshot: BTreeMap<String, String> = self
            .items
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let io_err = |source| StorageError::Io { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|source| StorageError::Corrupt { path: self.path.clone(), source })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        tracing::trace!("Persisted {} storage keys to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|entry| entry.value().clone())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.items.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}
