//! # Repository Errors

use thiserror::Error;

use crate::index::IndexError;
use crate::store::StorageError;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document already exists: {0}")]
    DocumentExists(String),
}

impl RepositoryError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            RepositoryError::Index(e) => e.code(),
            RepositoryError::Storage(e) => e.code(),
            RepositoryError::DocumentNotFound(_) => "FACET_DOCUMENT_NOT_FOUND",
            RepositoryError::DocumentExists(_) => "FACET_DOCUMENT_EXISTS",
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        RepositoryError::Index(IndexError::invalid_argument(reason))
    }
}
