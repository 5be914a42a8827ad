//! JSON file-backed secret storage implementation.
//!
//! This is the general key-value medium of the vault: session artifacts
//! always live here, and the bearer token lands here when the OS keyring
//! is unavailable. The backing file is a flat JSON object in the platform
//! configuration directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use super::{Secret, SecretStore, StoreError};

/// File name of the backing store in the config directory.
const STORE_FILE: &str = "session.json";

/// JSON file-backed key-value store.
///
/// Values are held in memory behind an `RwLock` and written back to disk
/// on every mutation. The file is created lazily on first write.
///
/// # Thread Safety
///
/// Safe to share across threads via `Arc`; the `RwLock` serializes
/// mutations and the subsequent save.
pub struct FileStore {
    path: PathBuf,
    data: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Get the default storage path.
    ///
    /// Returns the platform-specific configuration directory path for the
    /// session file.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let dirs = directories::ProjectDirs::from("pt", "marques", "tessera")
            .ok_or(StoreError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join(STORE_FILE))
    }

    /// Load the store from the default location.
    ///
    /// Creates parent directories if they don't exist.
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from_path(Self::default_path()?)
    }

    /// Load the store from a specific path.
    ///
    /// Creates parent directories if they don't exist. A missing file is
    /// treated as an empty store.
    pub fn load_from_path(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Save the current state to disk.
    fn save(&self, data: &HashMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .finish()
    }
}

#[async_trait]
impl SecretStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let data = self.data.read().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        Ok(data.get(key).map(Secret::new))
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        data.insert(key.to_string(), secret.expose().to_string());
        self.save(&data)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().map_err(|e| StoreError::BackendError {
            message: format!("lock poisoned: {}", e),
        })?;
        if data.remove(key).is_some() {
            self.save(&data)?;
        }
        Ok(())
    }
}
