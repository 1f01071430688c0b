//! Vault store for per-user CRUD over encrypted records

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::{Builder, Uuid};

use crate::config::{VaultConfig, DEFAULT_STORAGE_KEY};
use crate::crypto::{
    random_array, KeyDerivationParams, MasterPassword, OsRandom, RandomSource,
};
use crate::error::{Result, VaultError};
use crate::record::{
    EncryptedRecord, NoncePolicy, RecordCodec, RecordFields, RecordPatch, VaultRecord,
};
use crate::session::Session;
use crate::storage::KeyValueStore;

/// User id to that user's records, in insertion order
pub type VaultCollection = IndexMap<String, Vec<EncryptedRecord>>;

/// Vault store
///
/// The whole collection lives under one storage key and is rewritten on every
/// mutation. Mutations are serialised by an internal lock; reads rely on the
/// backend's atomic replace and take no lock.
pub struct VaultStore {
    /// Storage backend
    storage: Arc<dyn KeyValueStore>,
    /// Record encoder/decoder
    codec: Arc<RecordCodec>,
    /// Randomness for record identifiers
    rng: Arc<dyn RandomSource>,
    /// Key the collection is stored under
    storage_key: String,
    /// Serialises read-modify-write cycles
    write_lock: Mutex<()>,
}

impl VaultStore {
    /// Create a store with default parameters and the OS random source
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let rng: Arc<dyn RandomSource> = Arc::new(OsRandom);
        let codec = RecordCodec::new(
            KeyDerivationParams::default(),
            NoncePolicy::default(),
            rng.clone(),
        );

        Self {
            storage,
            codec: Arc::new(codec),
            rng,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store from configuration
    pub fn from_config(storage: Arc<dyn KeyValueStore>, config: &VaultConfig) -> Result<Self> {
        Self::with_random(storage, config, Arc::new(OsRandom))
    }

    /// Create a store from configuration with a specific random source
    pub fn with_random(
        storage: Arc<dyn KeyValueStore>,
        config: &VaultConfig,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        if config.storage_key.is_empty() {
            return Err(VaultError::InvalidInput(
                "Storage key must not be empty".to_string(),
            ));
        }

        let codec = RecordCodec::new(
            config.key_derivation_params()?,
            config.nonce_policy,
            rng.clone(),
        );

        debug!(
            "Vault store using {} under key '{}'",
            storage.backend_name(),
            config.storage_key
        );

        Ok(Self {
            storage,
            codec: Arc::new(codec),
            rng,
            storage_key: config.storage_key.clone(),
            write_lock: Mutex::new(()),
        })
    }

    /// Encrypt and append a new record, returning its decrypted view
    pub async fn create(&self, session: &Session, fields: RecordFields) -> Result<VaultRecord> {
        let codec = self.codec.clone();
        let password = session.master_password().clone();
        let plaintext = fields.clone();
        let encrypted = run_blocking(move || codec.encode(&plaintext, &password)).await?;

        let _guard = self.write_lock.lock().await;
        let mut collection = self.load_collection().await?;
        let records = collection
            .entry(session.user_id().to_string())
            .or_default();

        let id = self.new_record_id(records)?;
        let now = Utc::now();
        records.push(EncryptedRecord {
            id,
            fields: encrypted,
            created_at: now,
            updated_at: now,
        });

        self.persist_collection(&collection).await?;

        info!("Created record {} for user {}", id, session.user_id());
        Ok(VaultRecord {
            id,
            fields,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decrypt every record of the session's user
    ///
    /// Fails as a whole with `DecryptionFailed` if any single record does not
    /// decode; a partial result is never returned.
    pub async fn read_all(&self, session: &Session) -> Result<Vec<VaultRecord>> {
        let mut collection = self.load_collection().await?;
        let records = collection
            .swap_remove(session.user_id())
            .unwrap_or_default();
        let count = records.len();

        let tasks = records.into_iter().map(|record| {
            let codec = self.codec.clone();
            let password = session.master_password().clone();
            run_blocking(move || decode_record(&codec, &record, &password))
        });

        let decoded = try_join_all(tasks).await.map_err(|e| {
            warn!("Failed to read vault for user {}: {}", session.user_id(), e);
            e
        })?;

        debug!("Decrypted {} records for user {}", count, session.user_id());
        Ok(decoded)
    }

    /// Decrypt a single record
    pub async fn get(&self, session: &Session, id: Uuid) -> Result<VaultRecord> {
        let collection = self.load_collection().await?;
        let record = collection
            .get(session.user_id())
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned()
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        let codec = self.codec.clone();
        let password = session.master_password().clone();
        run_blocking(move || decode_record(&codec, &record, &password)).await
    }

    /// Decrypt a record, overlay `patch`, and store it re-encrypted
    pub async fn update(
        &self,
        session: &Session,
        id: Uuid,
        patch: RecordPatch,
    ) -> Result<VaultRecord> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load_collection().await?;

        let records = collection
            .get_mut(session.user_id())
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

        let existing = records[index].clone();
        let codec = self.codec.clone();
        let password = session.master_password().clone();
        let current = existing.fields.clone();
        let (fields, reencoded) =
            run_blocking(move || codec.reencode(&current, &patch, &password)).await?;

        let updated_at = next_updated_at(existing.updated_at, Utc::now());
        records[index] = EncryptedRecord {
            id,
            fields: reencoded,
            created_at: existing.created_at,
            updated_at,
        };

        self.persist_collection(&collection).await?;

        info!("Updated record {} for user {}", id, session.user_id());
        Ok(VaultRecord {
            id,
            fields,
            created_at: existing.created_at,
            updated_at,
        })
    }

    /// Remove a record; removing an absent id is not an error
    ///
    /// Returns whether a record was removed.
    pub async fn delete(&self, session: &Session, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut collection = self.load_collection().await?;

        let removed = match collection.get_mut(session.user_id()) {
            Some(records) => {
                let before = records.len();
                records.retain(|r| r.id != id);
                records.len() != before
            }
            None => false,
        };

        if removed {
            self.persist_collection(&collection).await?;
            info!("Deleted record {} for user {}", id, session.user_id());
        } else {
            debug!("Record {} not present for user {}", id, session.user_id());
        }

        Ok(removed)
    }

    /// Re-encrypt the user's whole vault under a new master password
    ///
    /// Every record must decode under the current password first; the
    /// collection is then written once. Timestamps are kept, since the
    /// record contents do not change. Returns a session for the new password.
    pub async fn change_master_password(
        &self,
        session: &Session,
        new_password: impl Into<MasterPassword>,
    ) -> Result<Session> {
        let new_session = session.with_password(new_password)?;

        let _guard = self.write_lock.lock().await;
        let mut collection = self.load_collection().await?;

        let Some(records) = collection.get_mut(session.user_id()) else {
            debug!("No records to re-encrypt for user {}", session.user_id());
            return Ok(new_session);
        };

        let current: Vec<EncryptedRecord> = records.clone();
        let tasks = current.into_iter().map(|record| {
            let codec = self.codec.clone();
            let old_password = session.master_password().clone();
            let new_password = new_session.master_password().clone();
            run_blocking(move || {
                let fields = codec.decode(&record.fields, &old_password)?;
                let reencoded = codec.encode(&fields, &new_password)?;
                Ok(EncryptedRecord {
                    fields: reencoded,
                    ..record
                })
            })
        });

        *records = try_join_all(tasks).await?;
        let count = records.len();

        self.persist_collection(&collection).await?;

        info!(
            "Re-encrypted {} records for user {} under a new master password",
            count,
            session.user_id()
        );
        Ok(new_session)
    }

    /// Load the full collection; a missing blob is an empty vault
    async fn load_collection(&self) -> Result<VaultCollection> {
        match self.storage.get(&self.storage_key).await? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(VaultCollection::new()),
        }
    }

    /// Replace the full collection in one write
    async fn persist_collection(&self, collection: &VaultCollection) -> Result<()> {
        let data = serde_json::to_vec(collection)?;
        self.storage.set(&self.storage_key, &data).await
    }

    /// Random identifier not already used in `records`
    fn new_record_id(&self, records: &[EncryptedRecord]) -> Result<Uuid> {
        loop {
            let id = Builder::from_random_bytes(random_array(self.rng.as_ref())?).into_uuid();
            if !records.iter().any(|r| r.id == id) {
                return Ok(id);
            }
        }
    }
}

/// Timestamp for a mutation: strictly after `previous`, even if the clock
/// has not advanced or has gone backwards
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::nanoseconds(1)
    }
}

fn decode_record(
    codec: &RecordCodec,
    record: &EncryptedRecord,
    password: &MasterPassword,
) -> Result<VaultRecord> {
    Ok(VaultRecord {
        id: record.id,
        fields: codec.decode(&record.fields, password)?,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Run CPU-bound key derivation and cipher work off the async executor
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}
