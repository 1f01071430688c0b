//! Cryptographic primitives for the vault
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA256 key derivation from the master password
//! - AES-256-GCM authenticated encryption of individual fields
//! - A pluggable secure random source
//! - Secure memory handling with zeroize

mod cipher;
mod key_derivation;
mod random;
mod secure_memory;

pub use cipher::{
    decrypt, decrypt_string, decrypt_with, encrypt, encrypt_string, encrypt_with, generate_nonce,
    open, seal, EncodedField, EncryptedField,
};
pub(crate) use cipher::{decode_base64, decode_fixed};
pub use key_derivation::{derive_key, generate_salt, KeyDerivationParams, MIN_ITERATIONS};
pub use random::{random_array, random_below, OsRandom, RandomSource};
pub use secure_memory::{DerivedKey, MasterPassword};

#[cfg(test)]
pub(crate) use random::testing;

/// Derived key length in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Key derivation salt length in bytes
pub const SALT_LEN: usize = 16;

/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;
