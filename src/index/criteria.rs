//! Conjunctive search criteria
//!
//! AND across predicates, OR across the alternatives of one predicate.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Accepted values for one predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetMatch {
    /// Exactly this value
    Exact(String),
    /// Any of these values
    AnyOf(BTreeSet<String>),
}

impl FacetMatch {
    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        FacetMatch::AnyOf(values.into_iter().map(Into::into).collect())
    }

    /// Alternatives in ascending order
    pub fn values(&self) -> Vec<&str> {
        match self {
            FacetMatch::Exact(value) => vec![value.as_str()],
            FacetMatch::AnyOf(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FacetMatch {
    fn from(value: &str) -> Self {
        FacetMatch::Exact(value.to_string())
    }
}

impl From<String> for FacetMatch {
    fn from(value: String) -> Self {
        FacetMatch::Exact(value)
    }
}

/// Type and facet predicates of one search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Type predicate, evaluated first
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<FacetMatch>,
    /// Facet predicates, evaluated in name order
    #[serde(default)]
    pub facets: BTreeMap<String, FacetMatch>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(FacetMatch::Exact(doc_type.into()));
        self
    }

    pub fn with_any_type<I, V>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.doc_type = Some(FacetMatch::any_of(types));
        self
    }

    pub fn with_facet(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.facets.insert(name.into(), FacetMatch::Exact(value.into()));
        self
    }

    pub fn with_any_facet<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.facets.insert(name.into(), FacetMatch::any_of(values));
        self
    }

    /// True when there is nothing for the index to select on
    pub fn is_unconstrained(&self) -> bool {
        self.doc_type.is_none() && self.facets.is_empty()
    }

    /// Number of predicates, type included
    pub fn predicate_count(&self) -> usize {
        self.facets.len() + usize::from(self.doc_type.is_some())
    }
}
