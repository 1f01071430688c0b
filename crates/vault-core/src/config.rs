//! Vault configuration
//!
//! Stores non-sensitive configuration in a plain JSON file next to the vault
//! data. A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::crypto::{KeyDerivationParams, MIN_ITERATIONS};
use crate::error::Result;
use crate::record::NoncePolicy;

/// Default storage key for the vault collection
pub const DEFAULT_STORAGE_KEY: &str = "vault_items";

/// Vault configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultConfig {
    /// Config file version
    pub version: u32,
    /// PBKDF2 iterations; must match the value existing records were written with
    pub kdf_iterations: u32,
    /// Nonce assignment for newly encoded records
    pub nonce_policy: NoncePolicy,
    /// Storage key holding the serialized collection
    pub storage_key: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            version: 1,
            kdf_iterations: MIN_ITERATIONS,
            nonce_policy: NoncePolicy::PerField,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl VaultConfig {
    /// Validated key derivation parameters
    pub fn key_derivation_params(&self) -> Result<KeyDerivationParams> {
        KeyDerivationParams::new(self.kdf_iterations)
    }
}

/// Config manager
pub struct ConfigManager {
    config_file: PathBuf,
    config: VaultConfig,
}

impl ConfigManager {
    /// Load the config from `storage_dir`, or defaults if absent
    pub fn new(storage_dir: &Path) -> Result<Self> {
        let config_file = storage_dir.join("config.json");
        let config = Self::load_from_file(&config_file)?;

        Ok(Self {
            config_file,
            config,
        })
    }

    /// Load config from file
    fn load_from_file(path: &Path) -> Result<VaultConfig> {
        if !path.exists() {
            debug!("No config file found, using defaults");
            return Ok(VaultConfig::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: VaultConfig = serde_json::from_str(&contents)?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save config to file
    pub async fn save(&self) -> Result<()> {
        // Reject configs that could never open a vault
        self.config.key_derivation_params()?;

        let contents = serde_json::to_string_pretty(&self.config)?;

        // Write atomically using temp file
        let temp_path = self.config_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.config_file).await?;

        debug!("Saved config to {:?}", self.config_file);
        Ok(())
    }

    /// Get current config
    pub fn get(&self) -> &VaultConfig {
        &self.config
    }

    /// Get mutable config
    pub fn get_mut(&mut self) -> &mut VaultConfig {
        &mut self.config
    }

    /// Update config and save
    pub async fn update(&mut self, config: VaultConfig) -> Result<()> {
        self.config = config;
        self.save().await
    }
}
