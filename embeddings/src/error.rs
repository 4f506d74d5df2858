//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur while generating embeddings.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No authenticated caller identity was supplied.
    #[error("authentication required")]
    AuthenticationRequired,

    /// A required parameter is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Text too long for embedding.
    #[error("text too long: {length} characters, max {max_length}")]
    InputTooLong { length: usize, max_length: usize },

    /// The requested provider does not produce embeddings.
    #[error("provider does not support embeddings: {0}")]
    UnsupportedProvider(String),

    /// The embedding provider call failed.
    #[error("embedding provider failed: {0}")]
    Provider(String),

    /// The persistence layer could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl EmbeddingError {
    /// Stable, user-safe code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "unauthenticated",
            Self::InvalidInput(_) => "invalid-argument",
            Self::InputTooLong { .. } => "input-too-long",
            Self::UnsupportedProvider(_) => "unsupported-provider",
            Self::Provider(_) => "provider-error",
            Self::StorageUnavailable(_) => "storage-unavailable",
        }
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Provider(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Provider(format!("malformed response: {err}"))
        } else {
            Self::Provider(format!("http error: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_codes() {
        assert_eq!(EmbeddingError::AuthenticationRequired.code(), "unauthenticated");
        assert_eq!(
            EmbeddingError::InputTooLong {
                length: 10,
                max_length: 5
            }
            .code(),
            "input-too-long"
        );
    }

    #[test]
    fn test_provider_message_wraps_cause() {
        let err = EmbeddingError::Provider("quota exceeded".to_string());
        assert_eq!(err.to_string(), "embedding provider failed: quota exceeded");
    }
}
