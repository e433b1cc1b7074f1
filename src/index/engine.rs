//! Facet index facade
//!
//! Ties the maintainer, the resolver and the paginator to one index store,
//! one key layout and one metrics registry, and logs every operation.
//!
//! # Consistency
//!
//! Eventual, last-writer-wins per index record. There is no lock around a
//! maintenance operation; see `maintainer` for what can be lost when two
//! writers race on one key.

use super::criteria::SearchCriteria;
use super::errors::{IndexError, IndexResult};
use super::key::{IndexKey, KeyLayout};
use super::maintainer::{IndexChanges, IndexMaintainer};
use super::record::IndexRecord;
use super::resolver::{QueryResolver, Resolution};
use crate::config::FacetConfig;
use crate::document::Indexable;
use crate::observability::{IndexMetrics, Logger, Severity};
use crate::pagination::{Page, Paginator, SortKey, Timestamped};
use crate::store::KeyValueStore;

/// Secondary facet index over a key-value store
pub struct FacetIndex<S> {
    store: S,
    layout: KeyLayout,
    config: FacetConfig,
    metrics: IndexMetrics,
}

impl<S> FacetIndex<S>
where
    S: KeyValueStore<IndexRecord>,
{
    /// Index with the default configuration
    pub fn new(store: S) -> Self {
        let config = FacetConfig::default();
        Self {
            store,
            layout: KeyLayout::from_config(&config),
            config,
            metrics: IndexMetrics::new(),
        }
    }

    /// Index with a validated configuration
    pub fn with_config(store: S, config: FacetConfig) -> IndexResult<Self> {
        config
            .validate()
            .map_err(|e| IndexError::invalid_argument(e.to_string()))?;
        Ok(Self {
            store,
            layout: KeyLayout::from_config(&config),
            config,
            metrics: IndexMetrics::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn config(&self) -> &FacetConfig {
        &self.config
    }

    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    fn maintainer(&self) -> IndexMaintainer<'_, S> {
        IndexMaintainer::new(&self.store, &self.layout, &self.metrics)
            .diff_type_on_update(self.config.diff_type_on_update)
    }

    fn resolver(&self) -> QueryResolver<'_, S> {
        QueryResolver::new(&self.store, &self.layout, &self.metrics)
    }

    /// Index a newly created document
    pub fn index<D: Indexable + ?Sized>(&self, doc: &D) -> IndexResult<IndexChanges> {
        let result = self.maintainer().on_create(doc);
        log_maintenance("INDEX_DOCUMENT", doc.id(), &result);
        result
    }

    /// Remove a deleted document from the index
    pub fn deindex<D: Indexable + ?Sized>(&self, doc: &D) -> IndexResult<IndexChanges> {
        let result = self.maintainer().on_delete(doc);
        log_maintenance("DEINDEX_DOCUMENT", doc.id(), &result);
        result
    }

    /// Move the index from `previous` to `next`
    pub fn reindex<P, N>(&self, previous: &P, next: &N) -> IndexResult<IndexChanges>
    where
        P: Indexable + ?Sized,
        N: Indexable + ?Sized,
    {
        let result = self.maintainer().on_update(previous, next);
        log_maintenance("REINDEX_DOCUMENT", next.id(), &result);
        result
    }

    /// Resolve `criteria` to matching document ids
    pub fn search(&self, criteria: &SearchCriteria) -> IndexResult<Resolution> {
        self.metrics.increment_searches_executed();

        match self.resolver().resolve(criteria) {
            Ok(resolution) => {
                let predicates = criteria.predicate_count().to_string();
                match &resolution {
                    Resolution::Unconstrained => {
                        Logger::trace("SEARCH_UNCONSTRAINED", &[]);
                    }
                    Resolution::Matched(ids) if ids.is_empty() => {
                        Logger::trace("SEARCH_SHORT_CIRCUIT", &[("predicates", predicates.as_str())]);
                    }
                    Resolution::Matched(ids) => {
                        let matches = ids.len().to_string();
                        Logger::trace(
                            "SEARCH_COMPLETE",
                            &[("matches", matches.as_str()), ("predicates", predicates.as_str())],
                        );
                    }
                }
                Ok(resolution)
            }
            Err(err) => {
                self.metrics.increment_searches_failed();
                let message = err.to_string();
                Logger::error("SEARCH_FAILED", &[("code", err.code()), ("error", message.as_str())]);
                Err(err)
            }
        }
    }

    /// Newest-first page of `candidates`
    pub fn paginate<T: Timestamped>(
        &self,
        candidates: Vec<T>,
        sort_key: SortKey,
        page_number: usize,
        page_size: usize,
    ) -> IndexResult<Page<T>> {
        Paginator::paginate(candidates, sort_key, page_number, page_size)
    }

    /// Point read of one index record
    pub fn record(&self, key: &IndexKey) -> IndexResult<Option<IndexRecord>> {
        Ok(self.store.get(key.as_str())?)
    }

    /// Every index record, in key order
    pub fn records(&self) -> IndexResult<Vec<IndexRecord>> {
        Ok(self.store.scan()?)
    }
}

fn log_maintenance(event: &str, document_id: &str, result: &IndexResult<IndexChanges>) {
    match result {
        Ok(changes) => {
            if !Logger::enabled(Severity::Trace) {
                return;
            }
            let created = changes.created.len().to_string();
            let updated = changes.updated.len().to_string();
            let pruned = changes.pruned.len().to_string();
            let missing = changes.missing.len().to_string();
            Logger::trace(
                event,
                &[
                    ("created", created.as_str()),
                    ("document_id", document_id),
                    ("missing", missing.as_str()),
                    ("pruned", pruned.as_str()),
                    ("updated", updated.as_str()),
                ],
            );
        }
        Err(err @ IndexError::Storage(_)) => {
            let message = err.to_string();
            Logger::error(
                "INDEX_STORAGE_FAILED",
                &[
                    ("code", err.code()),
                    ("document_id", document_id),
                    ("error", message.as_str()),
                    ("operation", event),
                ],
            );
        }
        Err(err) => {
            let message = err.to_string();
            Logger::warn(
                "INDEX_REQUEST_REJECTED",
                &[
                    ("code", err.code()),
                    ("document_id", document_id),
                    ("error", message.as_str()),
                    ("operation", event),
                ],
            );
        }
    }
}
