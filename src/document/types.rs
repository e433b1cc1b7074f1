//! Document value type
//!
//! Documents are immutable snapshots as far as the index is concerned: the
//! engine reads id, type and facets, and never writes back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pagination::{SortKey, Timestamped};
use crate::store::StoredRecord;

/// Anything the facet index can maintain entries for.
///
/// The index only ever needs these three views of an entity.
pub trait Indexable {
    /// Opaque document identifier
    fn id(&self) -> &str;

    /// Type tag, indexed under the synthetic type facet
    fn doc_type(&self) -> &str;

    /// Open facet bag; every value is a plain string
    fn facets(&self) -> &BTreeMap<String, String>;
}

/// A typed document carrying an open set of facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Primary key in the document store
    pub id: String,
    /// Type tag
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Facet name -> value
    #[serde(default)]
    pub facets: BTreeMap<String, String>,
    /// Optional parent document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Opaque payload, never indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document with no facets, stamped with the current time
    pub fn new(id: impl Into<String>, doc_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            doc_type: doc_type.into(),
            facets: BTreeMap::new(),
            parent_id: None,
            payload: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a document with a random UUID v4 id
    pub fn generate(doc_type: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), doc_type)
    }

    /// Adds or replaces a facet
    pub fn with_facet(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.facets.insert(name.into(), value.into());
        self
    }

    /// Replaces the whole facet bag
    pub fn with_facets<I, K, V>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.facets = facets
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    /// Returns a facet value if present
    pub fn facet(&self, name: &str) -> Option<&str> {
        self.facets.get(name).map(String::as_str)
    }
}

impl Indexable for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }

    fn facets(&self) -> &BTreeMap<String, String> {
        &self.facets
    }
}

impl StoredRecord for Document {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Timestamped for Document {
    fn sort_id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self, key: SortKey) -> DateTime<Utc> {
        match key {
            SortKey::CreatedAt => self.created_at,
            SortKey::UpdatedAt => self.updated_at,
        }
    }
}
