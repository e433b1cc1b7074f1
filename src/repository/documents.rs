//! Document CRUD with facet index maintenance
//!
//! Every write goes through the index first, then the document store. The
//! two stores share no transaction: a failure between the two steps leaves
//! the index ahead of the documents, which searches tolerate because ids
//! without a document are dropped when candidates are loaded.

use chrono::{DateTime, Utc};

use super::errors::{RepositoryError, RepositoryResult};
use crate::document::Document;
use crate::index::{FacetIndex, IndexRecord, Resolution, SearchCriteria};
use crate::observability::Logger;
use crate::pagination::{Page, Pageable, Paginator, SortKey};
use crate::store::KeyValueStore;

/// Inclusive `updated_at` window; an open bound matches everything on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// No bounds
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn until(to: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.to.map_or(true, |to| at <= to)
    }
}

/// Documents in one store, their facet index in another
pub struct DocumentRepository<D, I> {
    documents: D,
    index: FacetIndex<I>,
}

impl<D, I> DocumentRepository<D, I>
where
    D: KeyValueStore<Document>,
    I: KeyValueStore<IndexRecord>,
{
    pub fn new(documents: D, index: FacetIndex<I>) -> Self {
        Self { documents, index }
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    pub fn index(&self) -> &FacetIndex<I> {
        &self.index
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Document>> {
        Ok(self.documents.get(id)?)
    }

    /// Index and store a new document. Fails if the id is taken.
    pub fn create(&self, document: Document) -> RepositoryResult<Document> {
        if document.id.is_empty() {
            return Err(RepositoryError::invalid_argument("cannot create a document without an id"));
        }
        if self.documents.get(&document.id)?.is_some() {
            return Err(RepositoryError::DocumentExists(document.id));
        }

        self.index.index(&document)?;
        self.documents.put(document.clone())?;
        Logger::trace("DOCUMENT_CREATED", &[("document_id", document.id.as_str())]);
        Ok(document)
    }

    /// Reindex against the stored snapshot, then replace it
    pub fn update(&self, document: Document) -> RepositoryResult<Document> {
        if document.id.is_empty() {
            return Err(RepositoryError::invalid_argument("cannot update a document without an id"));
        }
        let Some(previous) = self.documents.get(&document.id)? else {
            return Err(RepositoryError::DocumentNotFound(document.id));
        };

        self.index.reindex(&previous, &document)?;
        self.documents.put(document.clone())?;
        Logger::trace("DOCUMENT_UPDATED", &[("document_id", document.id.as_str())]);
        Ok(document)
    }

    /// Create or update depending on whether the id is already stored
    pub fn save(&self, document: Document) -> RepositoryResult<Document> {
        if !document.id.is_empty() && self.documents.get(&document.id)?.is_some() {
            self.update(document)
        } else {
            self.create(document)
        }
    }

    /// Deindex and remove a stored document
    pub fn delete(&self, id: &str) -> RepositoryResult<Document> {
        if id.is_empty() {
            return Err(RepositoryError::invalid_argument("cannot delete a document without an id"));
        }
        let Some(document) = self.documents.get(id)? else {
            return Err(RepositoryError::DocumentNotFound(id.to_string()));
        };

        self.index.deindex(&document)?;
        self.documents.delete(id)?;
        Logger::trace("DOCUMENT_DELETED", &[("document_id", id)]);
        Ok(document)
    }

    /// Documents matching `criteria` whose `updated_at` lies in `range`,
    /// newest first.
    ///
    /// Without criteria the whole document store is scanned. Without a
    /// `Pageable` every match is returned as page 1.
    pub fn search(
        &self,
        criteria: &SearchCriteria,
        range: TimeRange,
        pageable: Option<Pageable>,
    ) -> RepositoryResult<Page<Document>> {
        if let Some(p) = pageable {
            Paginator::check_window(p.page_number, p.page_size)?;
        }

        let candidates = match self.index.search(criteria)? {
            Resolution::Unconstrained => self.documents.scan()?,
            Resolution::Matched(ids) if ids.is_empty() => {
                let page_number = pageable.map_or(1, |p| p.page_number);
                return Ok(Page::new(Vec::new(), page_number, 0));
            }
            Resolution::Matched(ids) => self.documents.batch_get(&ids)?.into_values().collect(),
        };

        let mut matching: Vec<Document> = candidates
            .into_iter()
            .filter(|doc| range.contains(doc.updated_at))
            .collect();

        match pageable {
            Some(p) => Ok(Paginator::paginate(
                matching,
                SortKey::UpdatedAt,
                p.page_number,
                p.page_size,
            )?),
            None => {
                Paginator::sort_desc(&mut matching, SortKey::UpdatedAt);
                let total = matching.len();
                Ok(Page::new(matching, 1, total))
            }
        }
    }

    /// Every match, newest first
    pub fn search_all(&self, criteria: &SearchCriteria) -> RepositoryResult<Vec<Document>> {
        Ok(self.search(criteria, TimeRange::all(), None)?.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexError;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    type Repo = DocumentRepository<MemoryStore<Document>, MemoryStore<IndexRecord>>;

    fn repo() -> Repo {
        DocumentRepository::new(MemoryStore::new(), FacetIndex::new(MemoryStore::new()))
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn event(id: &str, hour: u32, api: &str) -> Document {
        Document::new(id, "PUBLISH_API")
            .with_facet("api_id", api)
            .with_updated_at(at(hour))
    }

    #[test]
    fn test_create_and_find() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();

        assert_eq!(repo.find_by_id("e1").unwrap().unwrap().facet("api_id"), Some("a"));
        assert!(repo.find_by_id("e2").unwrap().is_none());
    }

    #[test]
    fn test_create_duplicate_rejected() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();

        let err = repo.create(event("e1", 2, "b")).unwrap_err();
        assert_eq!(err, RepositoryError::DocumentExists("e1".into()));
        // Index untouched by the rejected create
        assert!(repo.index().store().peek("api_id:b").is_none());
    }

    #[test]
    fn test_update_moves_index_entries() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();
        repo.update(event("e1", 2, "b")).unwrap();

        let by_a = repo.search_all(&SearchCriteria::new().with_facet("api_id", "a")).unwrap();
        let by_b = repo.search_all(&SearchCriteria::new().with_facet("api_id", "b")).unwrap();
        assert!(by_a.is_empty());
        assert_eq!(by_b.len(), 1);
        assert_eq!(by_b[0].updated_at, at(2));
    }

    #[test]
    fn test_update_unknown_document() {
        let repo = repo();
        let err = repo.update(event("ghost", 1, "a")).unwrap_err();
        assert_eq!(err, RepositoryError::DocumentNotFound("ghost".into()));
    }

    #[test]
    fn test_save_creates_then_updates() {
        let repo = repo();
        repo.save(event("e1", 1, "a")).unwrap();
        repo.save(event("e1", 2, "b")).unwrap();

        assert_eq!(repo.documents().len(), 1);
        assert!(repo.index().store().peek("api_id:a").is_none());
    }

    #[test]
    fn test_delete_prunes_index() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();
        repo.delete("e1").unwrap();

        assert!(repo.documents().is_empty());
        assert!(repo.index().store().is_empty());
        assert_eq!(
            repo.delete("e1").unwrap_err(),
            RepositoryError::DocumentNotFound("e1".into())
        );
    }

    #[test]
    fn test_search_orders_newest_first_and_pages() {
        let repo = repo();
        for hour in 0..7 {
            repo.create(event(&format!("e{}", hour), hour, "a")).unwrap();
        }

        let criteria = SearchCriteria::new().with_type("PUBLISH_API");
        let page = repo
            .search(&criteria, TimeRange::all(), Some(Pageable::new(2, 3)))
            .unwrap();

        let ids: Vec<&str> = page.content.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e2", "e1"]);
        assert_eq!(page.total_elements, 7);
    }

    #[test]
    fn test_search_time_range() {
        let repo = repo();
        for hour in 0..5 {
            repo.create(event(&format!("e{}", hour), hour, "a")).unwrap();
        }

        let criteria = SearchCriteria::new().with_facet("api_id", "a");
        let page = repo.search(&criteria, TimeRange::between(at(1), at(3)), None).unwrap();
        let ids: Vec<&str> = page.content.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e2", "e1"]);

        let since = repo.search(&criteria, TimeRange::since(at(4)), None).unwrap();
        assert_eq!(since.total_elements, 1);
    }

    #[test]
    fn test_search_without_criteria_scans() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();
        repo.create(Document::new("u1", "USER").with_updated_at(at(5))).unwrap();

        let all = repo.search_all(&SearchCriteria::new()).unwrap();
        let ids: Vec<&str> = all.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "e1"]);
    }

    #[test]
    fn test_empty_match_skips_document_store() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();
        repo.documents().clear_journal();

        let page = repo
            .search(&SearchCriteria::new().with_facet("api_id", "zzz"), TimeRange::all(), None)
            .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.page_number, 1);
        assert!(repo.documents().journal().is_empty());
    }

    #[test]
    fn test_empty_match_keeps_requested_page_number() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();

        let page = repo
            .search(
                &SearchCriteria::new().with_facet("api_id", "zzz"),
                TimeRange::all(),
                Some(Pageable::new(3, 10)),
            )
            .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.page_number, 3);
        assert_eq!(page.total_elements, 0);
    }

    #[test]
    fn test_update_rejects_type_change() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();

        let retyped = Document::new("e1", "RETIRE_API").with_facet("api_id", "a");
        let err = repo.update(retyped).unwrap_err();

        assert_eq!(err.code(), "FACET_INVALID_ARGUMENT");
        assert_eq!(repo.find_by_id("e1").unwrap().unwrap().doc_type, "PUBLISH_API");
        let found = repo.search_all(&SearchCriteria::new().with_type("PUBLISH_API")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_invalid_page_rejected_before_reads() {
        let repo = repo();
        let err = repo
            .search(&SearchCriteria::new().with_type("T"), TimeRange::all(), Some(Pageable::new(1, 0)))
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Index(IndexError::InvalidArgument(_))));
        assert!(repo.index().store().journal().is_empty());
    }

    #[test]
    fn test_stale_index_entries_are_dropped() {
        let repo = repo();
        repo.create(event("e1", 1, "a")).unwrap();
        repo.documents().delete("e1").unwrap();

        let found = repo.search_all(&SearchCriteria::new().with_facet("api_id", "a")).unwrap();
        assert!(found.is_empty());
    }
}
