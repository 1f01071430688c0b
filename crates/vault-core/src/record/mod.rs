//! Vault records and their encrypted representation

mod codec;
mod types;

pub use codec::{EncryptedRecordFields, FieldNonces, NoncePolicy, RecordCodec};
pub use types::*;
