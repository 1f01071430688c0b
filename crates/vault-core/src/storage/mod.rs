//! Storage backends for encrypted vault persistence
//!
//! This module provides two backends behind [`KeyValueStore`]:
//! 1. JSON files in the user's data directory
//! 2. Process memory (tests and ephemeral vaults)

mod file;
mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;
