//! Facet index for facetdb
//!
//! An inverted index from `facet:value` keys to the ids of the documents
//! currently holding that facet value, persisted as ordinary records in a
//! key-value store that has no secondary indexes of its own.
//!
//! # Design Principles
//!
//! - Write amplification for cheap reads: one record per distinct facet
//!   value (plus the type) is touched per document write, one point lookup
//!   per accepted value is issued per search predicate
//! - Incremental: updates read and write only the keys that changed
//! - No empty records: a record that loses its last member is deleted
//! - The maintainer is the only writer; the resolver only reads
//!
//! # Consistency
//!
//! No locks, no transactions: last-writer-wins per index record.

mod criteria;
mod engine;
mod errors;
mod key;
mod maintainer;
mod record;
mod resolver;

pub use criteria::{FacetMatch, SearchCriteria};
pub use engine::FacetIndex;
pub use errors::{IndexError, IndexResult};
pub use key::{IndexKey, KeyLayout};
pub use maintainer::{IndexChanges, IndexMaintainer};
pub use record::IndexRecord;
pub use resolver::{QueryResolver, Resolution};
