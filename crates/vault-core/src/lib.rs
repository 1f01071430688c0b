//! # vault-core
//!
//! Core functionality for a client-side credential vault:
//! - PBKDF2-HMAC-SHA256 key derivation from a master password
//! - AES-256-GCM authenticated encryption of individual record fields
//! - A record codec mapping plaintext records to their encrypted layout
//! - A per-user vault store over a pluggable key-value backend
//! - Password generation and strength scoring

pub mod config;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod record;
pub mod session;
pub mod storage;
pub mod vault;

pub use config::{ConfigManager, VaultConfig};
pub use crypto::{
    decrypt, decrypt_string, encrypt, encrypt_string, generate_salt, KeyDerivationParams,
    MasterPassword, OsRandom, RandomSource,
};
pub use error::{Result, VaultError};
pub use generator::{
    calculate_strength, generate_password, PasswordOptions, PasswordStrength, StrengthLabel,
};
pub use record::{
    EncryptedRecord, EncryptedRecordFields, NoncePolicy, RecordCodec, RecordFields, RecordPatch,
    VaultRecord,
};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use vault::{VaultCollection, VaultStore};
