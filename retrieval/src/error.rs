//! Error types for search and batch persistence.

use mentor_embeddings::EmbeddingError;
use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding error, propagated unchanged.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// A required parameter is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The document store failed.
    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

impl RetrievalError {
    /// Stable, user-safe code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Embedding(e) => e.code(),
            Self::InvalidInput(_) => "invalid-argument",
            Self::Storage(_) => "storage-unavailable",
        }
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Collection name is not usable by the backend.
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),

    /// Failed to create storage directory.
    #[error("failed to create directory: {0}")]
    CreateDirectory(String),

    /// Failed to read a collection.
    #[error("failed to read collection: {0}")]
    Read(String),

    /// Failed to write a collection.
    #[error("failed to write collection: {0}")]
    Write(String),

    /// Stored data could not be decoded.
    #[error("corrupt collection data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<StorageError> for EmbeddingError {
    fn from(err: StorageError) -> Self {
        EmbeddingError::StorageUnavailable(err.to_string())
    }
}
