//! Index keys
//!
//! An index key is `facet_name + separator + facet_value`. The document type
//! is indexed as one more facet under a reserved name. Two documents sharing
//! a facet name and value land on the same key; that collision is the index.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use crate::config::FacetConfig;
use crate::document::Indexable;

/// Primary key of an index record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKey(String);

impl IndexKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IndexKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds index keys and checks the names that go into them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    type_facet: String,
    separator: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::from_config(&FacetConfig::default())
    }
}

impl KeyLayout {
    pub fn new(type_facet: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            type_facet: type_facet.into(),
            separator: separator.into(),
        }
    }

    pub fn from_config(config: &FacetConfig) -> Self {
        Self::new(config.type_facet.clone(), config.key_separator.clone())
    }

    /// Reserved facet name the type tag is indexed under
    pub fn type_facet(&self) -> &str {
        &self.type_facet
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Key for one facet name/value pair
    pub fn facet_key(&self, name: &str, value: &str) -> IndexKey {
        IndexKey(format!("{}{}{}", name, self.separator, value))
    }

    /// Key for the synthetic type facet
    pub fn type_key(&self, doc_type: &str) -> IndexKey {
        self.facet_key(&self.type_facet, doc_type)
    }

    /// A facet name must be non-empty, must not contain the separator and
    /// must not shadow the type facet.
    pub fn check_facet_name(&self, name: &str) -> IndexResult<()> {
        if name.is_empty() {
            return Err(IndexError::invalid_argument("facet name must not be empty"));
        }
        if name.contains(&self.separator) {
            return Err(IndexError::invalid_argument(format!(
                "facet name '{}' contains the key separator '{}'",
                name, self.separator
            )));
        }
        if name == self.type_facet {
            return Err(IndexError::invalid_argument(format!(
                "facet name '{}' is reserved for the document type",
                name
            )));
        }
        Ok(())
    }

    /// Rejects documents that cannot be indexed unambiguously
    pub fn check_document<D: Indexable + ?Sized>(&self, doc: &D) -> IndexResult<()> {
        if doc.id().is_empty() {
            return Err(IndexError::invalid_argument("document id must not be empty"));
        }
        if doc.doc_type().is_empty() {
            return Err(IndexError::invalid_argument(format!(
                "document '{}' has an empty type",
                doc.id()
            )));
        }
        for name in doc.facets().keys() {
            self.check_facet_name(name)?;
        }
        Ok(())
    }

    /// Keys derived from the facet bag only
    pub fn facet_keys<D: Indexable + ?Sized>(&self, doc: &D) -> BTreeSet<IndexKey> {
        doc.facets()
            .iter()
            .map(|(name, value)| self.facet_key(name, value))
            .collect()
    }

    /// Facet keys plus the type key
    pub fn document_keys<D: Indexable + ?Sized>(&self, doc: &D) -> BTreeSet<IndexKey> {
        let mut keys = self.facet_keys(doc);
        keys.insert(self.type_key(doc.doc_type()));
        keys
    }
}

/// Store-level form of a key set
pub(crate) fn store_keys(keys: &BTreeSet<IndexKey>) -> BTreeSet<String> {
    keys.iter().map(|k| k.as_str().to_string()).collect()
}
