//! # In-Memory Store
//!
//! Keeps records in a `BTreeMap` behind a lock held for a single primitive
//! call only. Every call is appended to a journal so callers can inspect
//! which round trips an operation issued.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use super::backend::{KeyValueStore, StoredRecord};
use super::errors::{StorageError, StoreResult};

/// One primitive call as seen by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(String),
    BatchGet(BTreeSet<String>),
    Put(String),
    BatchPut(BTreeSet<String>),
    Delete(String),
    BatchDelete(BTreeSet<String>),
    Scan,
}

impl StoreOp {
    /// Whether this call modifies the store
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreOp::Put(_) | StoreOp::BatchPut(_) | StoreOp::Delete(_) | StoreOp::BatchDelete(_)
        )
    }

    /// Whether this call touches `key`. `Scan` touches every key.
    pub fn touches(&self, key: &str) -> bool {
        match self {
            StoreOp::Get(k) | StoreOp::Put(k) | StoreOp::Delete(k) => k == key,
            StoreOp::BatchGet(keys) | StoreOp::BatchPut(keys) | StoreOp::BatchDelete(keys) => {
                keys.contains(key)
            }
            StoreOp::Scan => true,
        }
    }
}

/// Process-local key-value store
#[derive(Debug)]
pub struct MemoryStore<R> {
    records: RwLock<BTreeMap<String, R>>,
    journal: Mutex<Vec<StoreOp>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            journal: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }
}

impl<R: StoredRecord> MemoryStore<R> {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct lookup that bypasses the journal
    pub fn peek(&self, key: &str) -> Option<R> {
        self.records.read().ok().and_then(|r| r.get(key).cloned())
    }

    /// Stored keys, bypassing the journal
    pub fn keys(&self) -> Vec<String> {
        self.records
            .read()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Calls issued so far, oldest first
    pub fn journal(&self) -> Vec<StoreOp> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    pub fn clear_journal(&self) {
        if let Ok(mut journal) = self.journal.lock() {
            journal.clear();
        }
    }

    /// Number of write calls that touched `key`
    pub fn writes_to(&self, key: &str) -> usize {
        self.journal()
            .iter()
            .filter(|op| op.is_write() && op.touches(key))
            .count()
    }

    /// Make every subsequent read fail with `Unavailable`
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with `Unavailable`
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record_op(&self, op: StoreOp) -> StoreResult<()> {
        let failing = if op.is_write() {
            self.fail_writes.load(Ordering::SeqCst)
        } else {
            self.fail_reads.load(Ordering::SeqCst)
        };
        self.journal
            .lock()
            .map_err(|_| StorageError::Unavailable("journal lock poisoned".to_string()))?
            .push(op);
        if failing {
            return Err(StorageError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }

    fn read_map(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, R>>> {
        self.records
            .read()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))
    }

    fn write_map(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, R>>> {
        self.records
            .write()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))
    }
}

impl<R: StoredRecord> KeyValueStore<R> for MemoryStore<R> {
    fn get(&self, key: &str) -> StoreResult<Option<R>> {
        self.record_op(StoreOp::Get(key.to_string()))?;
        Ok(self.read_map()?.get(key).cloned())
    }

    fn put(&self, record: R) -> StoreResult<()> {
        self.record_op(StoreOp::Put(record.key().to_string()))?;
        self.write_map()?.insert(record.key().to_string(), record);
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.record_op(StoreOp::Delete(key.to_string()))?;
        self.write_map()?.remove(key);
        Ok(())
    }

    fn scan(&self) -> StoreResult<Vec<R>> {
        self.record_op(StoreOp::Scan)?;
        Ok(self.read_map()?.values().cloned().collect())
    }

    fn batch_get(&self, keys: &BTreeSet<String>) -> StoreResult<BTreeMap<String, R>> {
        self.record_op(StoreOp::BatchGet(keys.clone()))?;
        let map = self.read_map()?;
        Ok(keys
            .iter()
            .filter_map(|k| map.get(k).map(|r| (k.clone(), r.clone())))
            .collect())
    }

    fn batch_put(&self, records: Vec<R>) -> StoreResult<()> {
        let keys = records.iter().map(|r| r.key().to_string()).collect();
        self.record_op(StoreOp::BatchPut(keys))?;
        let mut map = self.write_map()?;
        for record in records {
            map.insert(record.key().to_string(), record);
        }
        Ok(())
    }

    fn batch_delete(&self, keys: &BTreeSet<String>) -> StoreResult<()> {
        self.record_op(StoreOp::BatchDelete(keys.clone()))?;
        let mut map = self.write_map()?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}
