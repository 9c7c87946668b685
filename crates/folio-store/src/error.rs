//! Fact store error types.

use thiserror::Error;

use folio_types::FactError;

/// Fact store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Payload does not match the attribute schema.
    #[error("invalid fact: {0}")]
    InvalidFact(#[from] FactError),

    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row is not a valid fact.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Create a Corrupt error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

/// Fact store result type.
pub type StoreResult<T> = Result<T, StoreError>;
