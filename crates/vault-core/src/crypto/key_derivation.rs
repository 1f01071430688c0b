//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

use super::random::{random_array, RandomSource};
use super::{DerivedKey, KEY_LEN, SALT_LEN};
use crate::error::{Result, VaultError};

/// Lowest iteration count accepted for PBKDF2
pub const MIN_ITERATIONS: u32 = 100_000;

/// Parameters for PBKDF2 key derivation
///
/// The iteration count is not stored with the ciphertext, so it must match
/// the value the vault was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// PBKDF2 iterations (default: 100,000)
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
        }
    }
}

impl KeyDerivationParams {
    /// Create parameters, rejecting iteration counts below [`MIN_ITERATIONS`]
    pub fn new(iterations: u32) -> Result<Self> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(VaultError::InvalidInput(format!(
                "PBKDF2 iterations must be at least {}, got {}",
                MIN_ITERATIONS, self.iterations
            )));
        }
        Ok(())
    }
}

/// Generate a fresh random salt
pub fn generate_salt(rng: &dyn RandomSource) -> Result<[u8; SALT_LEN]> {
    random_array(rng)
}

/// Derive a 256-bit key from a password and salt
///
/// # Arguments
/// * `password` - The master password (must not be empty)
/// * `salt` - Exactly 16 bytes (use `generate_salt()` to create one)
/// * `params` - Optional key derivation parameters
///
/// # Returns
/// A 32-byte key suitable for AES-256-GCM
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: Option<KeyDerivationParams>,
) -> Result<DerivedKey> {
    let params = params.unwrap_or_default();
    params.validate()?;

    if password.is_empty() {
        return Err(VaultError::InvalidInput(
            "Master password must not be empty".to_string(),
        ));
    }
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidInput(format!(
            "Invalid salt length: expected {}, got {}",
            SALT_LEN,
            salt.len()
        )));
    }

    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, &mut key_bytes);

    let key = DerivedKey::new(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OsRandom;

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt(&OsRandom).unwrap();
        let salt2 = generate_salt(&OsRandom).unwrap();

        // Salts should be different
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = generate_salt(&OsRandom).unwrap();

        let key1 = derive_key("test-password-123", &salt, None).unwrap();
        let key2 = derive_key("test-password-123", &salt, None).unwrap();

        // Same password + salt should produce same key
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_passwords() {
        let salt = generate_salt(&OsRandom).unwrap();

        let key1 = derive_key("password1", &salt, None).unwrap();
        let key2 = derive_key("password2", &salt, None).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salts() {
        let key1 = derive_key("test-password", &generate_salt(&OsRandom).unwrap(), None).unwrap();
        let key2 = derive_key("test-password", &generate_salt(&OsRandom).unwrap(), None).unwrap();

        // Different salts should produce independent keys
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_iteration_count_changes_key() {
        let salt = *b"saltsaltsaltsalt";
        let key = derive_key("password", &salt, None).unwrap();
        let again = derive_key("password", &salt, Some(KeyDerivationParams::default())).unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());

        let params = KeyDerivationParams::new(100_001).unwrap();
        let stronger = derive_key("password", &salt, Some(params)).unwrap();
        assert_ne!(key.as_bytes(), stronger.as_bytes());
    }

    #[test]
    fn test_empty_password_rejected() {
        let salt = generate_salt(&OsRandom).unwrap();
        assert!(matches!(
            derive_key("", &salt, None),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_salt_length_rejected() {
        assert!(matches!(
            derive_key("password", &[0u8; 8], None),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(matches!(
            derive_key("password", &[0u8; 32], None),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_low_iterations_rejected() {
        assert!(matches!(
            KeyDerivationParams::new(1_000),
            Err(VaultError::InvalidInput(_))
        ));

        let salt = generate_salt(&OsRandom).unwrap();
        let weak = KeyDerivationParams { iterations: 10 };
        assert!(matches!(
            derive_key("password", &salt, Some(weak)),
            Err(VaultError::InvalidInput(_))
        ));
    }
}
