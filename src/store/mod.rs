//! Key-value store primitives
//!
//! The index layer sits on a plain hash-key store: point and batch reads,
//! unconditional upserts, idempotent deletes and a full scan. Nothing here
//! offers transactions across keys.
//!
//! Backends:
//! - `MemoryStore`: in-process, journals every call
//! - `FileStore`: one checksummed JSON file per record

mod backend;
mod errors;
mod file;
mod memory;

pub use backend::{KeyValueStore, StoredRecord};
pub use errors::{StorageError, StoreResult};
pub use file::FileStore;
pub use memory::{MemoryStore, StoreOp};
