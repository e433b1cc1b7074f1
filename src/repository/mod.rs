//! Document repository
//!
//! CRUD over a document store that keeps the facet index in step with every
//! write and serves searches through it.

mod documents;
mod errors;

pub use documents::{DocumentRepository, TimeRange};
pub use errors::{RepositoryError, RepositoryResult};
