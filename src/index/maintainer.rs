//! Index maintenance on document create, update and delete
//!
//! # Consistency model
//!
//! Index records are shared mutable state with no lock and no transaction
//! around a maintenance operation. Each operation is read-then-write:
//! batch-read the affected records, change memberships in memory, batch-write
//! the result. Two operations racing on the same key are last-writer-wins per
//! record, so one of them can lose its membership change. Nothing here
//! detects that.
//!
//! `on_create` and `on_delete` are safe to repeat after a partial failure:
//! set insertion and removal are idempotent. `on_update` is only safe to
//! repeat with the same pair of snapshots.

use std::collections::BTreeSet;

use super::errors::{IndexError, IndexResult};
use super::key::{store_keys, IndexKey, KeyLayout};
use super::record::IndexRecord;
use crate::document::Indexable;
use crate::observability::{IndexMetrics, Logger};
use crate::store::KeyValueStore;

/// Keys touched by one maintenance operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexChanges {
    /// Records written for the first time
    pub created: BTreeSet<IndexKey>,
    /// Existing records whose membership changed
    pub updated: BTreeSet<IndexKey>,
    /// Records deleted because their membership became empty
    pub pruned: BTreeSet<IndexKey>,
    /// Keys expected to exist that were already absent
    pub missing: BTreeSet<IndexKey>,
}

impl IndexChanges {
    /// True when nothing was written
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.pruned.is_empty()
    }

    /// Number of records written or deleted
    pub fn write_count(&self) -> usize {
        self.created.len() + self.updated.len() + self.pruned.len()
    }

    pub fn merge(&mut self, other: IndexChanges) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.pruned.extend(other.pruned);
        self.missing.extend(other.missing);
    }
}

/// Sole writer of index records
pub struct IndexMaintainer<'a, S> {
    store: &'a S,
    layout: &'a KeyLayout,
    metrics: &'a IndexMetrics,
    diff_type_on_update: bool,
}

impl<'a, S> IndexMaintainer<'a, S>
where
    S: KeyValueStore<IndexRecord>,
{
    pub fn new(store: &'a S, layout: &'a KeyLayout, metrics: &'a IndexMetrics) -> Self {
        Self {
            store,
            layout,
            metrics,
            diff_type_on_update: false,
        }
    }

    /// Allow type changes on update; the type key then moves with the document
    pub fn diff_type_on_update(mut self, enabled: bool) -> Self {
        self.diff_type_on_update = enabled;
        self
    }

    /// Adds `doc` to the record of every key it implies, type key included.
    ///
    /// One batch read, one batch write.
    pub fn on_create<D: Indexable + ?Sized>(&self, doc: &D) -> IndexResult<IndexChanges> {
        self.layout.check_document(doc)?;
        let changes = self.add_membership(doc.id(), &self.layout.document_keys(doc))?;
        self.metrics.increment_documents_indexed();
        Ok(changes)
    }

    /// Removes `doc` from the record of every key it implies, deleting
    /// records left without members.
    ///
    /// Absent records are logged and skipped.
    pub fn on_delete<D: Indexable + ?Sized>(&self, doc: &D) -> IndexResult<IndexChanges> {
        self.layout.check_document(doc)?;
        let changes = self.remove_membership(doc.id(), &self.layout.document_keys(doc))?;
        self.metrics.increment_documents_deindexed();
        Ok(changes)
    }

    /// Moves the index from `previous` to `next`.
    ///
    /// - `previous` has no facets: indexes `next` in full
    /// - `next` has no facets: deindexes `previous` in full
    /// - otherwise only the facet keys that differ are read and written
    ///
    /// A type change is rejected unless `diff_type_on_update` is set. When it
    /// is, the old type key is released in every case, so no record keeps a
    /// member that no longer holds its key.
    pub fn on_update<P, N>(&self, previous: &P, next: &N) -> IndexResult<IndexChanges>
    where
        P: Indexable + ?Sized,
        N: Indexable + ?Sized,
    {
        self.layout.check_document(previous)?;
        self.layout.check_document(next)?;
        if previous.id() != next.id() {
            return Err(IndexError::invalid_argument(format!(
                "cannot reindex '{}' as '{}'",
                previous.id(),
                next.id()
            )));
        }
        let type_changed = previous.doc_type() != next.doc_type();
        if type_changed && !self.diff_type_on_update {
            return Err(IndexError::invalid_argument(format!(
                "cannot change the type of '{}' from '{}' to '{}'",
                previous.id(),
                previous.doc_type(),
                next.doc_type()
            )));
        }

        let changes = if previous.facets().is_empty() {
            let mut changes = IndexChanges::default();
            if type_changed {
                let stale = BTreeSet::from([self.layout.type_key(previous.doc_type())]);
                changes.merge(self.remove_membership(previous.id(), &stale)?);
            }
            changes.merge(self.add_membership(next.id(), &self.layout.document_keys(next))?);
            changes
        } else if next.facets().is_empty() {
            self.remove_membership(previous.id(), &self.layout.document_keys(previous))?
        } else {
            let mut previous_keys = self.layout.facet_keys(previous);
            let mut next_keys = self.layout.facet_keys(next);
            if self.diff_type_on_update {
                previous_keys.insert(self.layout.type_key(previous.doc_type()));
                next_keys.insert(self.layout.type_key(next.doc_type()));
            }

            let to_remove: BTreeSet<IndexKey> =
                previous_keys.difference(&next_keys).cloned().collect();
            let to_add: BTreeSet<IndexKey> =
                next_keys.difference(&previous_keys).cloned().collect();

            let mut changes = self.remove_membership(previous.id(), &to_remove)?;
            changes.merge(self.add_membership(next.id(), &to_add)?);
            changes
        };

        self.metrics.increment_documents_reindexed();
        Ok(changes)
    }

    fn add_membership(
        &self,
        document_id: &str,
        keys: &BTreeSet<IndexKey>,
    ) -> IndexResult<IndexChanges> {
        let mut changes = IndexChanges::default();
        if keys.is_empty() {
            return Ok(changes);
        }

        let mut existing = self.store.batch_get(&store_keys(keys))?;
        let mut writes = Vec::with_capacity(keys.len());

        for key in keys {
            match existing.remove(key.as_str()) {
                Some(mut record) => {
                    if record.add_member(document_id) {
                        changes.updated.insert(key.clone());
                        writes.push(record);
                    }
                }
                None => {
                    changes.created.insert(key.clone());
                    writes.push(IndexRecord::with_member(key, document_id));
                }
            }
        }

        if !writes.is_empty() {
            self.store.batch_put(writes)?;
        }

        self.metrics.add_records_created(changes.created.len() as u64);
        self.metrics.add_records_updated(changes.updated.len() as u64);
        Ok(changes)
    }

    fn remove_membership(
        &self,
        document_id: &str,
        keys: &BTreeSet<IndexKey>,
    ) -> IndexResult<IndexChanges> {
        let mut changes = IndexChanges::default();
        if keys.is_empty() {
            return Ok(changes);
        }

        let mut existing = self.store.batch_get(&store_keys(keys))?;
        let mut to_delete = BTreeSet::new();
        let mut to_update = Vec::new();

        for key in keys {
            let Some(mut record) = existing.remove(key.as_str()) else {
                let missing = IndexError::not_found(key.as_str());
                Logger::warn(
                    "INDEX_RECORD_MISSING",
                    &[
                        ("code", missing.code()),
                        ("document_id", document_id),
                        ("key", key.as_str()),
                    ],
                );
                changes.missing.insert(key.clone());
                continue;
            };

            // Not a member: nothing to write for this key
            if !record.remove_member(document_id) {
                continue;
            }

            if record.is_empty() {
                to_delete.insert(record.id);
                changes.pruned.insert(key.clone());
            } else {
                to_update.push(record);
                changes.updated.insert(key.clone());
            }
        }

        if !to_delete.is_empty() {
            self.store.batch_delete(&to_delete)?;
        }
        if !to_update.is_empty() {
            self.store.batch_put(to_update)?;
        }

        self.metrics.add_records_pruned(changes.pruned.len() as u64);
        self.metrics.add_records_updated(changes.updated.len() as u64);
        self.metrics.add_records_missing(changes.missing.len() as u64);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::store::{MemoryStore, StoreOp};

    struct Fixture {
        store: MemoryStore<IndexRecord>,
        layout: KeyLayout,
        metrics: IndexMetrics,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                layout: KeyLayout::default(),
                metrics: IndexMetrics::new(),
            }
        }

        fn maintainer(&self) -> IndexMaintainer<'_, MemoryStore<IndexRecord>> {
            IndexMaintainer::new(&self.store, &self.layout, &self.metrics)
        }

        fn members(&self, key: &str) -> Option<Vec<String>> {
            self.store
                .peek(key)
                .map(|r| r.members.into_iter().collect())
        }
    }

    fn doc(id: &str, facets: &[(&str, &str)]) -> Document {
        Document::new(id, "T").with_facets(facets.iter().copied())
    }

    #[test]
    fn test_create_writes_type_and_facet_keys() {
        let f = Fixture::new();
        let changes = f.maintainer().on_create(&doc("d1", &[("a", "1"), ("b", "2")])).unwrap();

        assert_eq!(changes.created.len(), 3);
        assert_eq!(f.members("type:T"), Some(vec!["d1".to_string()]));
        assert_eq!(f.members("a:1"), Some(vec!["d1".to_string()]));
        assert_eq!(f.members("b:2"), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn test_create_is_one_read_and_one_write() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[("a", "1")])).unwrap();

        let journal = f.store.journal();
        assert_eq!(journal.len(), 2);
        assert!(matches!(journal[0], StoreOp::BatchGet(_)));
        assert!(matches!(journal[1], StoreOp::BatchPut(_)));
    }

    #[test]
    fn test_create_extends_existing_record() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[("a", "1")])).unwrap();
        let changes = f.maintainer().on_create(&doc("d2", &[("a", "1")])).unwrap();

        assert!(changes.created.is_empty());
        assert_eq!(changes.updated.len(), 2);
        assert_eq!(f.members("a:1"), Some(vec!["d1".to_string(), "d2".to_string()]));
    }

    #[test]
    fn test_delete_prunes_empty_records() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[("a", "1")])).unwrap();
        f.maintainer().on_create(&doc("d2", &[("b", "2")])).unwrap();

        let changes = f.maintainer().on_delete(&doc("d1", &[("a", "1")])).unwrap();

        assert!(changes.pruned.contains(&f.layout.facet_key("a", "1")));
        assert!(changes.updated.contains(&f.layout.type_key("T")));
        assert_eq!(f.members("a:1"), None);
        assert_eq!(f.members("type:T"), Some(vec!["d2".to_string()]));
    }

    #[test]
    fn test_delete_with_missing_record_is_not_fatal() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[("a", "1")])).unwrap();
        f.store.delete("a:1").unwrap();

        let changes = f.maintainer().on_delete(&doc("d1", &[("a", "1")])).unwrap();

        assert!(changes.missing.contains(&f.layout.facet_key("a", "1")));
        assert!(changes.pruned.contains(&f.layout.type_key("T")));
        assert_eq!(f.metrics.snapshot().records_missing, 1);
    }

    #[test]
    fn test_update_touches_only_changed_keys() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[("a", "1"), ("b", "2")])).unwrap();
        f.store.clear_journal();

        let changes = f
            .maintainer()
            .on_update(&doc("d1", &[("a", "1"), ("b", "2")]), &doc("d1", &[("a", "1"), ("b", "3")]))
            .unwrap();

        assert_eq!(changes.pruned.len(), 1);
        assert_eq!(changes.created.len(), 1);
        assert_eq!(f.store.writes_to("a:1"), 0);
        assert_eq!(f.store.writes_to("type:T"), 0);
        assert!(f.store.journal().iter().all(|op| !op.touches("a:1")));
        assert_eq!(f.members("b:2"), None);
        assert_eq!(f.members("b:3"), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn test_update_from_empty_facets_indexes_next() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[])).unwrap();

        f.maintainer().on_update(&doc("d1", &[]), &doc("d1", &[("a", "1")])).unwrap();

        assert_eq!(f.members("a:1"), Some(vec!["d1".to_string()]));
        assert_eq!(f.members("type:T"), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn test_update_to_empty_facets_deindexes_previous() {
        let f = Fixture::new();
        f.maintainer().on_create(&doc("d1", &[("a", "1")])).unwrap();

        f.maintainer().on_update(&doc("d1", &[("a", "1")]), &doc("d1", &[])).unwrap();

        assert_eq!(f.members("a:1"), None);
        assert_eq!(f.members("type:T"), None);
    }

    #[test]
    fn test_update_rejects_type_change_by_default() {
        let f = Fixture::new();
        let before = Document::new("d1", "T").with_facet("a", "1");
        let after = Document::new("d1", "U").with_facet("a", "2");
        f.maintainer().on_create(&before).unwrap();
        f.store.clear_journal();

        let err = f.maintainer().on_update(&before, &after).unwrap_err();

        assert!(matches!(err, IndexError::InvalidArgument(_)));
        assert!(f.store.journal().is_empty());
        assert_eq!(f.members("type:T"), Some(vec!["d1".to_string()]));
        assert_eq!(f.members("a:1"), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn test_type_change_from_empty_facets_moves_type_key() {
        let f = Fixture::new();
        let before = Document::new("d1", "T");
        let after = Document::new("d1", "U").with_facet("a", "1");
        f.maintainer().on_create(&before).unwrap();

        f.maintainer()
            .diff_type_on_update(true)
            .on_update(&before, &after)
            .unwrap();

        assert_eq!(f.members("type:T"), None);
        assert_eq!(f.members("type:U"), Some(vec!["d1".to_string()]));
        assert_eq!(f.members("a:1"), Some(vec!["d1".to_string()]));
    }

    #[test]
    fn test_type_change_to_empty_facets_leaves_nothing_behind() {
        let f = Fixture::new();
        let before = Document::new("d1", "T").with_facet("a", "1");
        let after = Document::new("d1", "U");
        f.maintainer().on_create(&before).unwrap();

        f.maintainer()
            .diff_type_on_update(true)
            .on_update(&before, &after)
            .unwrap();

        assert_eq!(f.members("type:T"), None);
        assert_eq!(f.members("a:1"), None);
    }

    #[test]
    fn test_update_diffs_type_when_enabled() {
        let f = Fixture::new();
        let before = Document::new("d1", "T").with_facet("a", "1");
        let after = Document::new("d1", "U").with_facet("a", "1");
        f.maintainer().on_create(&before).unwrap();

        let changes = f
            .maintainer()
            .diff_type_on_update(true)
            .on_update(&before, &after)
            .unwrap();

        assert_eq!(changes.write_count(), 2);
        assert_eq!(f.members("type:T"), None);
        assert_eq!(f.members("type:U"), Some(vec!["d1".to_string()]));
        assert_eq!(f.store.writes_to("a:1"), 1);
    }

    #[test]
    fn test_update_rejects_id_change() {
        let f = Fixture::new();
        let err = f
            .maintainer()
            .on_update(&doc("d1", &[("a", "1")]), &doc("d2", &[("a", "1")]))
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
        assert!(f.store.journal().is_empty());
    }

    #[test]
    fn test_invalid_document_never_reaches_store() {
        let f = Fixture::new();
        let err = f.maintainer().on_create(&doc("", &[("a", "1")])).unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
        assert!(f.store.journal().is_empty());
    }

    #[test]
    fn test_storage_failure_propagates() {
        let f = Fixture::new();
        f.store.set_fail_writes(true);

        let err = f.maintainer().on_create(&doc("d1", &[("a", "1")])).unwrap_err();
        assert!(matches!(err, IndexError::Storage(_)));
        assert_eq!(f.metrics.snapshot().documents_indexed, 0);
    }
}
