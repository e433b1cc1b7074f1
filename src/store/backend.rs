//! # Key-Value Store Trait
//!
//! The only primitives the index layer consumes from the underlying store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::errors::StoreResult;

/// A record addressed by a single string primary key
pub trait StoredRecord: Clone + Send + Sync {
    /// Primary key
    fn key(&self) -> &str;
}

/// Hash-key access to records of type `R`.
///
/// - Writes are unconditional upserts.
/// - Deletes are idempotent.
/// - Missing keys are omitted from `batch_get`, never reported as errors.
/// - There is no transaction spanning several calls.
///
/// The batch defaults fall back to one call per key; backends with a native
/// batch round trip override them.
pub trait KeyValueStore<R: StoredRecord>: Send + Sync {
    /// Point read by primary key
    fn get(&self, key: &str) -> StoreResult<Option<R>>;

    /// Upsert one record
    fn put(&self, record: R) -> StoreResult<()>;

    /// Remove one record; absent keys are fine
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// Every record in the store, in key order
    fn scan(&self) -> StoreResult<Vec<R>>;

    /// Read several keys in one round trip
    fn batch_get(&self, keys: &BTreeSet<String>) -> StoreResult<BTreeMap<String, R>> {
        let mut found = BTreeMap::new();
        for key in keys {
            if let Some(record) = self.get(key)? {
                found.insert(key.clone(), record);
            }
        }
        Ok(found)
    }

    /// Upsert several records in one round trip
    fn batch_put(&self, records: Vec<R>) -> StoreResult<()> {
        for record in records {
            self.put(record)?;
        }
        Ok(())
    }

    /// Remove several keys in one round trip
    fn batch_delete(&self, keys: &BTreeSet<String>) -> StoreResult<()> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }
}

impl<R, S> KeyValueStore<R> for Arc<S>
where
    R: StoredRecord,
    S: KeyValueStore<R> + ?Sized,
{
    fn get(&self, key: &str) -> StoreResult<Option<R>> {
        (**self).get(key)
    }

    fn put(&self, record: R) -> StoreResult<()> {
        (**self).put(record)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn scan(&self) -> StoreResult<Vec<R>> {
        (**self).scan()
    }

    fn batch_get(&self, keys: &BTreeSet<String>) -> StoreResult<BTreeMap<String, R>> {
        (**self).batch_get(keys)
    }

    fn batch_put(&self, records: Vec<R>) -> StoreResult<()> {
        (**self).batch_put(records)
    }

    fn batch_delete(&self, keys: &BTreeSet<String>) -> StoreResult<()> {
        (**self).batch_delete(keys)
    }
}
