//! # Key-Value Store Errors

use thiserror::Error;

/// Result type for store primitives
pub type StoreResult<T> = Result<T, StorageError>;

/// Failures of the underlying key-value store.
///
/// Absent keys are never errors: `get` returns `None`, `batch_get` omits
/// them and `delete` of an absent key succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Record '{key}' is corrupted: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "FACET_STORAGE_UNAVAILABLE",
            StorageError::Io(_) => "FACET_STORAGE_IO",
            StorageError::Corrupted { .. } => "FACET_STORAGE_CORRUPTED",
            StorageError::Serialization(_) => "FACET_STORAGE_SERIALIZATION",
        }
    }

    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
