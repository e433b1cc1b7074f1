//! Persisted index record: one index key and the documents holding it
//!
//! A record with no members is never stored; absence means "no document has
//! this facet value".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::key::IndexKey;
use crate::store::StoredRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// The index key, primary key in the store
    pub id: String,
    /// Ids of documents currently holding this facet value
    #[serde(default)]
    pub members: BTreeSet<String>,
}

impl IndexRecord {
    /// A record with no members yet
    pub fn new(key: &IndexKey) -> Self {
        Self {
            id: key.as_str().to_string(),
            members: BTreeSet::new(),
        }
    }

    /// A record with a single member
    pub fn with_member(key: &IndexKey, document_id: impl Into<String>) -> Self {
        let mut record = Self::new(key);
        record.members.insert(document_id.into());
        record
    }

    /// Returns true if the member was not already present
    pub fn add_member(&mut self, document_id: &str) -> bool {
        self.members.insert(document_id.to_string())
    }

    /// Returns true if the member was present
    pub fn remove_member(&mut self, document_id: &str) -> bool {
        self.members.remove(document_id)
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.members.contains(document_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

impl StoredRecord for IndexRecord {
    fn key(&self) -> &str {
        &self.id
    }
}
