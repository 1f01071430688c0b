//! Secure memory handling with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::KEY_LEN;

/// Symmetric key derived from the master password - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Create a new derived key from raw bytes
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Master password held for the duration of a session - automatically zeroed when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterPassword {
    value: String,
}

impl MasterPassword {
    /// Wrap a caller-supplied password
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Get the password (use carefully)
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Whether the password is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<&str> for MasterPassword {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MasterPassword {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterPassword")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_password_expose() {
        let password = MasterPassword::new("correct-horse");
        assert_eq!(password.expose(), "correct-horse");
        assert!(!password.is_empty());
        assert!(MasterPassword::from("").is_empty());
    }

    #[test]
    fn test_debug_redacted() {
        let key = DerivedKey::new([7u8; KEY_LEN]);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('7'));

        let password = MasterPassword::new("hunter2");
        let debug = format!("{:?}", password);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter2"));
    }
}
