//! Error types for vault-core

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// Nothing in the core retries on error. `DecryptionFailed` deliberately
/// carries no detail: a wrong password and corrupted or tampered data must be
/// indistinguishable to the caller.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Secure random source unavailable: {0}")]
    RandomnessUnavailable(String),

    #[error("Decryption failed - wrong master password or corrupted data")]
    DecryptionFailed,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl VaultError {
    /// Whether the error is caused by the environment rather than by the
    /// caller's input or data. Such errors should be surfaced as
    /// unrecoverable.
    pub fn is_environmental(&self) -> bool {
        matches!(
            self,
            Self::RandomnessUnavailable(_) | Self::IoError(_) | Self::TaskFailed(_)
        )
    }
}

impl From<tokio::task::JoinError> for VaultError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}
