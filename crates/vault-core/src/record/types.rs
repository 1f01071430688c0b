//! Vault record type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::codec::EncryptedRecordFields;

/// The five user-editable fields of a record - automatically zeroed when dropped
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RecordFields {
    /// Display title (e.g., "GitHub")
    pub title: String,
    /// Login name or email
    pub username: String,
    /// The secret itself
    pub password: String,
    /// Site address
    pub url: String,
    /// Free-form notes
    pub notes: String,
}

impl RecordFields {
    /// Create a new set of record fields
    pub fn new(
        title: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            username: username.into(),
            password: password.into(),
            url: url.into(),
            notes: notes.into(),
        }
    }
}

impl std::fmt::Debug for RecordFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFields")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("notes", &"[REDACTED]")
            .finish()
    }
}

/// Partial update of a record; `None` leaves the field unchanged
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
}

impl RecordPatch {
    /// Replace the title
    pub fn title(mut self, value: impl Into<String>) -> Self {
        self.title = Some(value.into());
        self
    }

    /// Replace the username
    pub fn username(mut self, value: impl Into<String>) -> Self {
        self.username = Some(value.into());
        self
    }

    /// Replace the password
    pub fn password(mut self, value: impl Into<String>) -> Self {
        self.password = Some(value.into());
        self
    }

    /// Replace the url
    pub fn url(mut self, value: impl Into<String>) -> Self {
        self.url = Some(value.into());
        self
    }

    /// Replace the notes
    pub fn notes(mut self, value: impl Into<String>) -> Self {
        self.notes = Some(value.into());
        self
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.url.is_none()
            && self.notes.is_none()
    }

    /// Overlay the supplied fields onto `fields`
    pub fn apply_to(&self, fields: &mut RecordFields) {
        let overlay = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                target.zeroize();
                target.push_str(value);
            }
        };

        overlay(&mut fields.title, &self.title);
        overlay(&mut fields.username, &self.username);
        overlay(&mut fields.password, &self.password);
        overlay(&mut fields.url, &self.url);
        overlay(&mut fields.notes, &self.notes);
    }
}

impl std::fmt::Debug for RecordPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("RecordPatch")
            .field("title", &self.title)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("url", &self.url)
            .field("notes", &redacted(&self.notes))
            .finish()
    }
}

/// Decrypted view of a stored record
///
/// Only ever handed out as a copy; the store keeps the encrypted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Plaintext fields
    pub fields: RecordFields,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Stored record (encrypted) - the persisted layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Encrypted fields, IV and salt
    #[serde(flatten)]
    pub fields: EncryptedRecordFields,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}
