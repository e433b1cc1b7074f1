//! Consistency Model Tests
//!
//! Index maintenance takes no locks and spans several store calls, so two
//! operations that read the same record before either writes it race, and
//! the later write wins. These tests pin that behavior down.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use facetdb::document::Document;
use facetdb::index::{FacetIndex, IndexRecord, SearchCriteria};
use facetdb::store::{KeyValueStore, MemoryStore, StoreResult};

// =============================================================================
// Helper Functions
// =============================================================================

/// Serves reads from a frozen snapshot while one is set; writes always land.
///
/// Freezing before two maintenance operations reproduces the interleaving
/// "A reads, B reads, A writes, B writes".
struct StaleReads {
    inner: MemoryStore<IndexRecord>,
    frozen: Mutex<Option<BTreeMap<String, IndexRecord>>>,
}

impl StaleReads {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            frozen: Mutex::new(None),
        }
    }

    fn freeze(&self) {
        let snapshot = self
            .inner
            .scan()
            .unwrap()
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        *self.frozen.lock().unwrap() = Some(snapshot);
    }

    fn thaw(&self) {
        *self.frozen.lock().unwrap() = None;
    }
}

impl KeyValueStore<IndexRecord> for StaleReads {
    fn get(&self, key: &str) -> StoreResult<Option<IndexRecord>> {
        match self.frozen.lock().unwrap().as_ref() {
            Some(snapshot) => Ok(snapshot.get(key).cloned()),
            None => self.inner.get(key),
        }
    }

    fn put(&self, record: IndexRecord) -> StoreResult<()> {
        self.inner.put(record)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key)
    }

    fn scan(&self) -> StoreResult<Vec<IndexRecord>> {
        self.inner.scan()
    }

    fn batch_get(&self, keys: &BTreeSet<String>) -> StoreResult<BTreeMap<String, IndexRecord>> {
        match self.frozen.lock().unwrap().as_ref() {
            Some(snapshot) => Ok(keys
                .iter()
                .filter_map(|k| snapshot.get(k).map(|r| (k.clone(), r.clone())))
                .collect()),
            None => self.inner.batch_get(keys),
        }
    }
}

fn event(id: &str) -> Document {
    Document::new(id, "DEPLOY").with_facet("env", "prod")
}

fn members(store: &StaleReads, key: &str) -> Vec<String> {
    store
        .inner
        .peek(key)
        .map(|r| r.members.into_iter().collect())
        .unwrap_or_default()
}

// =============================================================================
// Last-Writer-Wins Tests
// =============================================================================

/// Two creates racing on the same record: the first membership is lost.
#[test]
fn test_concurrent_creates_lose_an_update() {
    let store = Arc::new(StaleReads::new());
    let index = FacetIndex::new(Arc::clone(&store));
    index.index(&event("seed")).unwrap();

    store.freeze();
    index.index(&event("a")).unwrap();
    index.index(&event("b")).unwrap();
    store.thaw();

    assert_eq!(members(&store, "env:prod"), vec!["b", "seed"]);
    let found = index
        .search(&SearchCriteria::new().with_facet("env", "prod"))
        .unwrap()
        .into_ids()
        .unwrap();
    assert!(!found.contains("a"));
}

/// Sequential operations through the same store see each other's writes.
#[test]
fn test_sequential_creates_are_not_lost() {
    let store = Arc::new(StaleReads::new());
    let index = FacetIndex::new(Arc::clone(&store));

    index.index(&event("a")).unwrap();
    index.index(&event("b")).unwrap();

    assert_eq!(members(&store, "env:prod"), vec!["a", "b"]);
}

/// A racing delete can resurrect a pruned record's stale membership.
#[test]
fn test_racing_delete_and_create() {
    let store = Arc::new(StaleReads::new());
    let index = FacetIndex::new(Arc::clone(&store));
    index.index(&event("a")).unwrap();

    store.freeze();
    index.deindex(&event("a")).unwrap();
    index.index(&event("b")).unwrap();
    store.thaw();

    // b read {a} and wrote {a, b} after a's delete pruned the record
    assert_eq!(members(&store, "env:prod"), vec!["a", "b"]);
}
