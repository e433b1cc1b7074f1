//! Documents the facet index is maintained for
//!
//! A document is identified by an opaque string id, carries a type tag and an
//! open bag of string facets. The index depends only on the `Indexable`
//! trait, so callers may index their own entity types.

mod types;

pub use types::{Document, Indexable};
