//! File storage backend
//!
//! Stores each key as `<key>.json` in the user's data directory. Values are
//! written to a temporary file and renamed into place, so a crash never
//! leaves a half-written blob behind.

use async_trait::async_trait;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::KeyValueStore;
use crate::error::{Result, VaultError};

/// File-backed key-value store
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory for storage files
    storage_dir: PathBuf,
}

impl FileStore {
    /// Create a file store in the default data directory
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Create with a custom storage directory
    pub fn with_dir(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;

        debug!("File storage initialized at: {:?}", storage_dir);
        Ok(Self { storage_dir })
    }

    /// Get the default storage directory
    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("io", "secure-vault", "secure-vault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::StorageError("Could not determine data directory".to_string())
            })
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Path of the file holding `key`
    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');

        if !valid {
            return Err(VaultError::InvalidInput(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }

        Ok(self.storage_dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!("Read {} bytes for key: {}", data.len(), key);
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Key not found: {}", key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.entry_path(key)?;

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, value).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Stored {} bytes for key: {}", value.len(), key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "File Storage"
    }
}
