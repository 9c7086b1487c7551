//! Error types for versioned storage.

use xel_types::{EntityId, Height};

/// Storage error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("row {id} already has a version at height {latest}, cannot insert at {attempted}")]
    HeightRegression {
        id: EntityId,
        latest: Height,
        attempted: Height,
    },

    #[error("row {0} not found")]
    RowNotFound(EntityId),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for xel_types::TxError {
    fn from(err: StorageError) -> Self {
        xel_types::TxError::Store(err.to_string())
    }
}
