//! Caller-held session
//!
//! A session pairs the user id with the master password for as long as the
//! caller keeps it alive. It is passed explicitly into every vault operation;
//! the core keeps no session state of its own. The password is zeroed when
//! the session is dropped.

use chrono::{DateTime, Utc};

use crate::crypto::MasterPassword;
use crate::error::{Result, VaultError};

/// Authenticated user and master password
#[derive(Debug, Clone)]
pub struct Session {
    user_id: String,
    master_password: MasterPassword,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Start a session, rejecting an empty user id or password
    pub fn new(
        user_id: impl Into<String>,
        master_password: impl Into<MasterPassword>,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let master_password = master_password.into();

        if user_id.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "User id must not be empty".to_string(),
            ));
        }
        if master_password.is_empty() {
            return Err(VaultError::InvalidInput(
                "Master password must not be empty".to_string(),
            ));
        }

        Ok(Self {
            user_id,
            master_password,
            started_at: Utc::now(),
        })
    }

    /// The user this session belongs to
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The master password (use carefully)
    pub fn master_password(&self) -> &MasterPassword {
        &self.master_password
    }

    /// When the session was started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Same user, different master password
    pub fn with_password(&self, master_password: impl Into<MasterPassword>) -> Result<Self> {
        Self::new(self.user_id.clone(), master_password)
    }
}
