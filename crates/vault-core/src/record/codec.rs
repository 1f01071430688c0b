//! Record codec: five plaintext fields to and from their encrypted-at-rest form
//!
//! Each encode draws one salt and derives one key for the whole record. The
//! [`NoncePolicy`] decides whether the five fields share a nonce (the legacy
//! layout) or get one each. Decoding accepts both forms.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{RecordFields, RecordPatch};
use crate::crypto::{
    decode_base64, decode_fixed, derive_key, generate_nonce, generate_salt, open, seal,
    DerivedKey, KeyDerivationParams, MasterPassword, OsRandom, RandomSource, NONCE_LEN, SALT_LEN,
};
use crate::error::{Result, VaultError};

/// How nonces are assigned to the fields of one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// One nonce per field, listed in `fieldIvs`
    #[default]
    PerField,
    /// One nonce shared by all five fields (bit-compatible with legacy vaults)
    Shared,
}

/// Per-field nonces, base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNonces {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
}

/// Encrypted form of the five fields plus the record's IV and salt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecordFields {
    pub title_encrypted: String,
    pub username_encrypted: String,
    pub password_encrypted: String,
    pub url_encrypted: String,
    pub notes_encrypted: String,
    /// Shared nonce, or the title nonce for per-field records
    pub iv: String,
    pub salt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_ivs: Option<FieldNonces>,
}

/// Nonces in field order: title, username, password, url, notes
type RecordNonces = [[u8; NONCE_LEN]; 5];

impl EncryptedRecordFields {
    /// The nonce for each field, in field order
    ///
    /// For per-field records `iv` must equal the title nonce; a mismatch is
    /// treated as tampering.
    fn nonces(&self) -> Result<RecordNonces> {
        let iv: [u8; NONCE_LEN] = decode_fixed(&self.iv)?;
        match &self.field_ivs {
            Some(ivs) => {
                let title: [u8; NONCE_LEN] = decode_fixed(&ivs.title)?;
                if title != iv {
                    return Err(VaultError::DecryptionFailed);
                }
                Ok([
                    title,
                    decode_fixed(&ivs.username)?,
                    decode_fixed(&ivs.password)?,
                    decode_fixed(&ivs.url)?,
                    decode_fixed(&ivs.notes)?,
                ])
            }
            None => Ok([iv; 5]),
        }
    }

    /// Nonce policy this record was written with
    pub fn nonce_policy(&self) -> NoncePolicy {
        if self.field_ivs.is_some() {
            NoncePolicy::PerField
        } else {
            NoncePolicy::Shared
        }
    }
}

/// Encodes and decodes whole records under the master password
pub struct RecordCodec {
    params: KeyDerivationParams,
    policy: NoncePolicy,
    rng: Arc<dyn RandomSource>,
}

impl RecordCodec {
    /// Create a codec
    pub fn new(
        params: KeyDerivationParams,
        policy: NoncePolicy,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self { params, policy, rng }
    }

    /// Nonce policy applied when encoding
    pub fn policy(&self) -> NoncePolicy {
        self.policy
    }

    /// Key derivation parameters
    pub fn params(&self) -> KeyDerivationParams {
        self.params
    }

    /// Encrypt all five fields under a fresh salt and fresh nonce(s)
    pub fn encode(
        &self,
        fields: &RecordFields,
        password: &MasterPassword,
    ) -> Result<EncryptedRecordFields> {
        let rng = self.rng.as_ref();
        let salt = generate_salt(rng)?;

        let nonces: RecordNonces = match self.policy {
            NoncePolicy::Shared => [generate_nonce(rng)?; 5],
            NoncePolicy::PerField => [
                generate_nonce(rng)?,
                generate_nonce(rng)?,
                generate_nonce(rng)?,
                generate_nonce(rng)?,
                generate_nonce(rng)?,
            ],
        };

        let key = derive_key(password.expose(), &salt, Some(self.params))?;
        let seal_field = |plaintext: &str, nonce: &[u8; NONCE_LEN]| -> Result<String> {
            Ok(STANDARD.encode(seal(&key, nonce, plaintext.as_bytes())?))
        };

        let field_ivs = match self.policy {
            NoncePolicy::Shared => None,
            NoncePolicy::PerField => Some(FieldNonces {
                title: STANDARD.encode(nonces[0]),
                username: STANDARD.encode(nonces[1]),
                password: STANDARD.encode(nonces[2]),
                url: STANDARD.encode(nonces[3]),
                notes: STANDARD.encode(nonces[4]),
            }),
        };

        let encrypted = EncryptedRecordFields {
            title_encrypted: seal_field(&fields.title, &nonces[0])?,
            username_encrypted: seal_field(&fields.username, &nonces[1])?,
            password_encrypted: seal_field(&fields.password, &nonces[2])?,
            url_encrypted: seal_field(&fields.url, &nonces[3])?,
            notes_encrypted: seal_field(&fields.notes, &nonces[4])?,
            iv: STANDARD.encode(nonces[0]),
            salt: STANDARD.encode(salt),
            field_ivs,
        };

        debug!("Encoded record fields ({:?} nonces)", self.policy);
        Ok(encrypted)
    }

    /// Decrypt all five fields; any single failure fails the whole record
    pub fn decode(
        &self,
        encrypted: &EncryptedRecordFields,
        password: &MasterPassword,
    ) -> Result<RecordFields> {
        if password.is_empty() {
            return Err(VaultError::DecryptionFailed);
        }

        let salt: [u8; SALT_LEN] = decode_fixed(&encrypted.salt)?;
        let nonces = encrypted.nonces()?;
        let key = derive_key(password.expose(), &salt, Some(self.params))?;

        Ok(RecordFields {
            title: open_field(&key, &nonces[0], &encrypted.title_encrypted)?,
            username: open_field(&key, &nonces[1], &encrypted.username_encrypted)?,
            password: open_field(&key, &nonces[2], &encrypted.password_encrypted)?,
            url: open_field(&key, &nonces[3], &encrypted.url_encrypted)?,
            notes: open_field(&key, &nonces[4], &encrypted.notes_encrypted)?,
        })
    }

    /// Decode, overlay `patch`, and re-encode under fresh salt and nonces
    ///
    /// Returns the merged plaintext and its new encrypted form; the old
    /// ciphertext is not reused.
    pub fn reencode(
        &self,
        encrypted: &EncryptedRecordFields,
        patch: &RecordPatch,
        password: &MasterPassword,
    ) -> Result<(RecordFields, EncryptedRecordFields)> {
        let mut fields = self.decode(encrypted, password)?;
        patch.apply_to(&mut fields);
        let reencoded = self.encode(&fields, password)?;
        Ok((fields, reencoded))
    }
}

fn open_field(key: &DerivedKey, nonce: &[u8; NONCE_LEN], ciphertext: &str) -> Result<String> {
    let plaintext = open(key, nonce, &decode_base64(ciphertext)?)?;
    String::from_utf8(plaintext).map_err(|_| VaultError::DecryptionFailed)
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new(
            KeyDerivationParams::default(),
            NoncePolicy::default(),
            Arc::new(OsRandom),
        )
    }
}

impl std::fmt::Debug for RecordCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCodec")
            .field("params", &self.params)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
