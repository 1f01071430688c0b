//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Durable key-value persistence for opaque blobs
///
/// `set` must replace the stored value atomically: a reader sees either the
/// old blob or the new one, never a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value with the given key, replacing any previous value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
