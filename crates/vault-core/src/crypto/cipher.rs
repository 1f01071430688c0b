//! AES-256-GCM authenticated encryption of single fields
//!
//! Every call to [`encrypt`] draws a fresh 16-byte salt and 12-byte nonce,
//! derives a key from the password, and produces ciphertext with the 16-byte
//! GCM tag appended. No associated data is bound.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::key_derivation::{derive_key, generate_salt, KeyDerivationParams};
use super::random::{random_array, OsRandom, RandomSource};
use super::{DerivedKey, NONCE_LEN, SALT_LEN, TAG_LEN};
use crate::error::{Result, VaultError};

/// Encrypted field: ciphertext (tag appended), nonce and salt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    /// Ciphertext followed by the GCM tag
    pub ciphertext: Vec<u8>,
    /// Nonce (12 bytes for GCM)
    pub nonce: [u8; NONCE_LEN],
    /// Key derivation salt
    pub salt: [u8; SALT_LEN],
}

/// Base64 form of an [`EncryptedField`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedField {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
}

impl EncryptedField {
    /// Encode every component as standard base64
    pub fn encode(&self) -> EncodedField {
        EncodedField {
            ciphertext: STANDARD.encode(&self.ciphertext),
            iv: STANDARD.encode(self.nonce),
            salt: STANDARD.encode(self.salt),
        }
    }
}

impl EncodedField {
    /// Parse the base64 components back into raw bytes
    ///
    /// Malformed input is reported as `DecryptionFailed`, the same as any
    /// other corruption of stored data.
    pub fn decode(&self) -> Result<EncryptedField> {
        Ok(EncryptedField {
            ciphertext: decode_base64(&self.ciphertext)?,
            nonce: decode_fixed(&self.iv)?,
            salt: decode_fixed(&self.salt)?,
        })
    }
}

/// Decode a base64 string, mapping failure to `DecryptionFailed`
pub(crate) fn decode_base64(value: &str) -> Result<Vec<u8>> {
    STANDARD.decode(value).map_err(|_| VaultError::DecryptionFailed)
}

/// Decode a base64 string that must hold exactly `N` bytes
pub(crate) fn decode_fixed<const N: usize>(value: &str) -> Result<[u8; N]> {
    let bytes = decode_base64(value)?;
    bytes.try_into().map_err(|_| VaultError::DecryptionFailed)
}

/// Generate a fresh random nonce
pub fn generate_nonce(rng: &dyn RandomSource) -> Result<[u8; NONCE_LEN]> {
    random_array(rng)
}

/// Encrypt with an already-derived key and caller-chosen nonce
///
/// The caller is responsible for never reusing `nonce` with `key` for a
/// different plaintext.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::InvalidInput(e.to_string()))?;

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| VaultError::InvalidInput(format!("Encryption failed: {}", e)))?;

    debug_assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);
    Ok(ciphertext)
}

/// Decrypt and verify with an already-derived key
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|_| VaultError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::DecryptionFailed)
}

/// Encrypt plaintext under a password using the OS random source and default parameters
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<EncryptedField> {
    encrypt_with(&OsRandom, plaintext, password, KeyDerivationParams::default())
}

/// Encrypt plaintext under a password
///
/// # Arguments
/// * `rng` - Source for the salt and nonce
/// * `plaintext` - The data to encrypt
/// * `password` - The master password
/// * `params` - Key derivation parameters
pub fn encrypt_with(
    rng: &dyn RandomSource,
    plaintext: &[u8],
    password: &str,
    params: KeyDerivationParams,
) -> Result<EncryptedField> {
    let salt = generate_salt(rng)?;
    let nonce = generate_nonce(rng)?;
    let key = derive_key(password, &salt, Some(params))?;
    let ciphertext = seal(&key, &nonce, plaintext)?;

    Ok(EncryptedField {
        ciphertext,
        nonce,
        salt,
    })
}

/// Decrypt a field using default parameters
pub fn decrypt(field: &EncryptedField, password: &str) -> Result<Vec<u8>> {
    decrypt_with(field, password, KeyDerivationParams::default())
}

/// Decrypt a field, re-deriving the key from its salt
///
/// Wrong password, corrupted ciphertext or tag, and tampered nonce or salt
/// all fail with the same `DecryptionFailed`.
pub fn decrypt_with(
    field: &EncryptedField,
    password: &str,
    params: KeyDerivationParams,
) -> Result<Vec<u8>> {
    // An empty password can never have produced a field
    if password.is_empty() {
        return Err(VaultError::DecryptionFailed);
    }

    let key = derive_key(password, &field.salt, Some(params))?;
    open(&key, &field.nonce, &field.ciphertext)
}

/// Encrypt a string and return its base64 form
pub fn encrypt_string(plaintext: &str, password: &str) -> Result<EncodedField> {
    Ok(encrypt(plaintext.as_bytes(), password)?.encode())
}

/// Decrypt from base64 form and return as string
pub fn decrypt_string(encoded: &EncodedField, password: &str) -> Result<String> {
    let plaintext = decrypt(&encoded.decode()?, password)?;
    String::from_utf8(plaintext).map_err(|_| VaultError::DecryptionFailed)
}
