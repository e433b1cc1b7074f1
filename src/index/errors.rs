//! Index error types
//!
//! Error codes:
//! - FACET_INDEX_STORAGE_FAILED: the store failed; always surfaced to the caller
//! - FACET_INDEX_RECORD_MISSING: an expected index record was absent; recovered as a no-op
//! - FACET_INVALID_ARGUMENT: rejected before any store call

use thiserror::Error;

use crate::store::StorageError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("Index record not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl IndexError {
    pub fn not_found(key: impl Into<String>) -> Self {
        IndexError::NotFound(key.into())
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        IndexError::InvalidArgument(reason.into())
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::Storage(_) => "FACET_INDEX_STORAGE_FAILED",
            IndexError::NotFound(_) => "FACET_INDEX_RECORD_MISSING",
            IndexError::InvalidArgument(_) => "FACET_INVALID_ARGUMENT",
        }
    }

    /// Only a missing record is handled locally; everything else reaches the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IndexError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(IndexError::not_found("a:1").code(), "FACET_INDEX_RECORD_MISSING");
        assert_eq!(IndexError::invalid_argument("x").code(), "FACET_INVALID_ARGUMENT");
        let storage: IndexError = StorageError::Unavailable("down".into()).into();
        assert_eq!(storage.code(), "FACET_INDEX_STORAGE_FAILED");
    }

    #[test]
    fn test_only_not_found_is_recoverable() {
        assert!(IndexError::not_found("a:1").is_recoverable());
        assert!(!IndexError::invalid_argument("x").is_recoverable());
        assert!(!IndexError::from(StorageError::Io("disk".into())).is_recoverable());
    }

    #[test]
    fn test_display_wraps_storage_error() {
        let err = IndexError::from(StorageError::Unavailable("timeout".into()));
        assert_eq!(err.to_string(), "Storage failure: Store unavailable: timeout");
    }
}
