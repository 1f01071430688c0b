//! End-to-end vault scenarios over the public API

use std::sync::Arc;

use proptest::prelude::*;
use tempfile::TempDir;
use vault_core::{
    decrypt_string, encrypt_string, FileStore, KeyValueStore, MemoryStore, NoncePolicy,
    RecordFields, RecordPatch, Session, VaultConfig, VaultError, VaultStore,
};

fn example_fields() -> RecordFields {
    RecordFields::new("Example", "a@b.com", "Secr3t!", "https://example.com", "")
}

fn memory_store() -> VaultStore {
    VaultStore::new(Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn create_then_read_all_round_trips() {
    let store = memory_store();
    let session = Session::new("alice", "correct-horse").unwrap();

    let created = store.create(&session, example_fields()).await.unwrap();
    assert_eq!(created.created_at, created.updated_at);

    let records = store.read_all(&session).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, created.id);
    assert_eq!(records[0].fields, example_fields());
    assert_eq!(records[0].created_at, records[0].updated_at);

    let wrong = Session::new("alice", "wrong-horse").unwrap();
    assert!(matches!(
        store.read_all(&wrong).await,
        Err(VaultError::DecryptionFailed)
    ));
}

#[tokio::test]
async fn password_only_update_keeps_other_fields() {
    let store = memory_store();
    let session = Session::new("alice", "correct-horse").unwrap();
    let created = store.create(&session, example_fields()).await.unwrap();

    let updated = store
        .update(&session, created.id, RecordPatch::default().password("NewPass1"))
        .await
        .unwrap();

    assert_eq!(updated.fields.password, "NewPass1");
    assert_eq!(updated.fields.username, "a@b.com");
    assert_eq!(updated.fields.title, "Example");
    assert_eq!(updated.fields.url, "https://example.com");
    assert_eq!(updated.fields.notes, "");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > updated.created_at);

    let stored = store.get(&session, created.id).await.unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn deleted_record_is_gone_and_others_survive() {
    let store = memory_store();
    let session = Session::new("alice", "correct-horse").unwrap();

    let keep = store.create(&session, example_fields()).await.unwrap();
    let doomed = store
        .create(
            &session,
            RecordFields::new("Bank", "alice", "hunter2", "https://bank.test", "pin 0000"),
        )
        .await
        .unwrap();

    assert!(store.delete(&session, doomed.id).await.unwrap());
    assert!(!store.delete(&session, doomed.id).await.unwrap());

    let records = store.read_all(&session).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, keep.id);
    assert!(matches!(
        store.get(&session, doomed.id).await,
        Err(VaultError::NotFound(_))
    ));
}

#[tokio::test]
async fn collection_persists_across_file_stores() {
    let dir = TempDir::new().unwrap();
    let session = Session::new("alice", "correct-horse").unwrap();

    let id = {
        let storage = FileStore::with_dir(dir.path().to_path_buf()).unwrap();
        let store = VaultStore::new(Arc::new(storage));
        store.create(&session, example_fields()).await.unwrap().id
    };

    let storage = FileStore::with_dir(dir.path().to_path_buf()).unwrap();
    assert!(storage.get("vault_items").await.unwrap().is_some());

    let store = VaultStore::new(Arc::new(storage));
    let records = store.read_all(&session).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].fields, example_fields());
}

#[tokio::test]
async fn shared_nonce_records_stay_readable() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = Session::new("alice", "correct-horse").unwrap();

    let legacy_config = VaultConfig {
        nonce_policy: NoncePolicy::Shared,
        ..VaultConfig::default()
    };
    let legacy = VaultStore::from_config(storage.clone(), &legacy_config).unwrap();
    let id = legacy.create(&session, example_fields()).await.unwrap().id;

    let current = VaultStore::from_config(storage, &VaultConfig::default()).unwrap();
    let record = current.get(&session, id).await.unwrap();
    assert_eq!(record.fields, example_fields());

    // Rewriting moves the record onto per-field nonces
    let updated = current
        .update(&session, id, RecordPatch::default().notes("migrated"))
        .await
        .unwrap();
    assert_eq!(updated.fields.notes, "migrated");
    assert_eq!(updated.fields.password, "Secr3t!");
}

#[tokio::test]
async fn changed_master_password_replaces_old_one() {
    let store = memory_store();
    let session = Session::new("alice", "correct-horse").unwrap();
    store.create(&session, example_fields()).await.unwrap();

    let rotated = store
        .change_master_password(&session, "battery-staple")
        .await
        .unwrap();

    let records = store.read_all(&rotated).await.unwrap();
    assert_eq!(records[0].fields, example_fields());
    assert!(matches!(
        store.read_all(&session).await,
        Err(VaultError::DecryptionFailed)
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_string_round_trips(plaintext in "\\PC{0,64}", password in "\\PC{1,32}") {
        let encoded = encrypt_string(&plaintext, &password).unwrap();
        prop_assert_eq!(decrypt_string(&encoded, &password).unwrap(), plaintext);
    }
}
