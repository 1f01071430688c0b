//! Per-user encrypted record storage

mod store;

pub use store::{VaultCollection, VaultStore};
