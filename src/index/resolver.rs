//! Resolves search criteria to a set of document ids through the index
//!
//! Each predicate becomes one batch read of its keys (one key per accepted
//! value); the members of the records found are unioned, and the per-predicate
//! sets are intersected. The first predicate with no candidates ends the
//! resolution: no further reads are issued.
//!
//! The primary document store is never read here.

use std::collections::{BTreeMap, BTreeSet};

use super::criteria::{FacetMatch, SearchCriteria};
use super::errors::IndexResult;
use super::key::{store_keys, IndexKey, KeyLayout};
use super::record::IndexRecord;
use crate::observability::IndexMetrics;
use crate::store::KeyValueStore;

/// Outcome of resolving criteria against the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No predicates: the index selects nothing and the caller decides
    /// what "everything" means
    Unconstrained,
    /// Ids of documents satisfying every predicate, possibly none
    Matched(BTreeSet<String>),
}

impl Resolution {
    /// Matched ids, or `None` when unconstrained
    pub fn ids(&self) -> Option<&BTreeSet<String>> {
        match self {
            Resolution::Unconstrained => None,
            Resolution::Matched(ids) => Some(ids),
        }
    }

    pub fn into_ids(self) -> Option<BTreeSet<String>> {
        match self {
            Resolution::Unconstrained => None,
            Resolution::Matched(ids) => Some(ids),
        }
    }

    /// True when the index positively selected nothing
    pub fn is_empty_match(&self) -> bool {
        matches!(self, Resolution::Matched(ids) if ids.is_empty())
    }
}

/// Read-only view of the index used for searches
pub struct QueryResolver<'a, S> {
    store: &'a S,
    layout: &'a KeyLayout,
    metrics: &'a IndexMetrics,
}

impl<'a, S> QueryResolver<'a, S>
where
    S: KeyValueStore<IndexRecord>,
{
    pub fn new(store: &'a S, layout: &'a KeyLayout, metrics: &'a IndexMetrics) -> Self {
        Self {
            store,
            layout,
            metrics,
        }
    }

    /// Resolve `criteria`: type predicate first, then facets in name order.
    ///
    /// Facet names are checked before the first read. A store failure aborts
    /// the whole resolution; a partial set is never returned.
    pub fn resolve(&self, criteria: &SearchCriteria) -> IndexResult<Resolution> {
        for name in criteria.facets.keys() {
            self.layout.check_facet_name(name)?;
        }

        let predicates = self.predicate_keys(criteria);
        if predicates.is_empty() {
            return Ok(Resolution::Unconstrained);
        }

        let mut result: Option<BTreeSet<String>> = None;
        for keys in predicates {
            let candidates = self.candidates(&keys)?;
            if candidates.is_empty() {
                self.metrics.increment_searches_short_circuited();
                return Ok(Resolution::Matched(BTreeSet::new()));
            }

            result = Some(match result {
                None => candidates,
                Some(current) => current.intersection(&candidates).cloned().collect(),
            });
        }

        Ok(Resolution::Matched(result.unwrap_or_default()))
    }

    /// Key set of every predicate, in evaluation order
    fn predicate_keys(&self, criteria: &SearchCriteria) -> Vec<BTreeSet<IndexKey>> {
        let mut predicates = Vec::with_capacity(criteria.predicate_count());

        if let Some(types) = &criteria.doc_type {
            predicates.push(self.keys_for(self.layout.type_facet(), types));
        }
        for (name, accepted) in &criteria.facets {
            predicates.push(self.keys_for(name, accepted));
        }

        predicates
    }

    fn keys_for(&self, name: &str, accepted: &FacetMatch) -> BTreeSet<IndexKey> {
        accepted
            .values()
            .into_iter()
            .map(|value| self.layout.facet_key(name, value))
            .collect()
    }

    /// Union of the members of every record found for `keys`
    fn candidates(&self, keys: &BTreeSet<IndexKey>) -> IndexResult<BTreeSet<String>> {
        if keys.is_empty() {
            return Ok(BTreeSet::new());
        }

        let records: BTreeMap<String, IndexRecord> = self.store.batch_get(&store_keys(keys))?;
        Ok(records
            .into_values()
            .flat_map(|record| record.members)
            .collect())
    }
}
