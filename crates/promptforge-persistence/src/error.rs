//! Error types for persistence operations

use promptforge_types::{ForgeError, RecordKind};
use thiserror::Error;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite / driver failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON column could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No row with the requested id
    #[error("{kind} not found: '{id}'")]
    NotFound { kind: RecordKind, id: String },

    /// Record rejected before it reached the database
    #[error("invalid record: {0}")]
    Invalid(ForgeError),

    /// A stored value no longer decodes into the model
    #[error("corrupt value in column '{column}': {reason}")]
    Corrupt { column: String, reason: String },
}

impl StoreError {
    pub(crate) fn not_found(kind: RecordKind, id: &str) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn corrupt(column: &str, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            column: column.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<StoreError> for ForgeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => ForgeError::NotFound { kind, key: id },
            StoreError::Invalid(inner) => inner,
            other => ForgeError::Storage(other.to_string()),
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
