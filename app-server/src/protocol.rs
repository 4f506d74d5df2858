//! Wire types for the line-delimited JSON protocol.
//!
//! Each input line is one [`Request`]; each output line is one [`Response`]
//! carrying the request's `id`.

use mentor_embeddings::{CallerIdentity, Embedding};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method names accepted by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GenerateEmbedding,
    BatchGenerateEmbeddings,
    FindSimilarDocuments,
    GetEmbeddingModels,
}

impl Method {
    /// Look up a method by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "generateEmbedding" => Some(Self::GenerateEmbedding),
            "batchGenerateEmbeddings" => Some(Self::BatchGenerateEmbeddings),
            "findSimilarDocuments" => Some(Self::FindSimilarDocuments),
            "getEmbeddingModels" => Some(Self::GetEmbeddingModels),
            _ => None,
        }
    }

    /// Whether the method needs an authenticated caller.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Self::GetEmbeddingModels)
    }
}

/// An incoming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id echoed in the response.
    #[serde(default)]
    pub id: Value,

    /// Method name.
    pub method: String,

    /// Method parameters.
    #[serde(default)]
    pub params: Value,

    /// Caller identity established by the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<CallerIdentity>,
}

/// An outgoing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id of the request.
    pub id: Value,

    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    /// A successful response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// A failed response.
    pub fn failure(id: Value, error: ErrorBody) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// User-safe error description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: String,

    /// Human-readable message.
    pub message: String,
}

impl ErrorBody {
    /// Create an error body.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Parameters of `generateEmbedding`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateEmbeddingParams {
    /// Text to embed.
    pub text: String,

    /// Provider selector.
    pub provider: Option<String>,
}

/// Result of `generateEmbedding`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateEmbeddingResult {
    /// The vector.
    pub embedding: Embedding,

    /// Model that produced it.
    pub model: String,

    /// Length of the vector.
    pub dimensions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_parsing() {
        let request: Request = serde_json::from_value(json!({
            "id": 7,
            "method": "generateEmbedding",
            "params": {"text": "hi"},
            "auth": {"userId": "u1"}
        }))
        .unwrap();

        assert_eq!(request.id, json!(7));
        assert_eq!(Method::from_name(&request.method), Some(Method::GenerateEmbedding));
        assert_eq!(request.auth.unwrap().user_id, "u1");
    }

    #[test]
    fn test_non_string_text_is_rejected() {
        let result = serde_json::from_value::<GenerateEmbeddingParams>(json!({"text": 123}));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_omits_empty_sides() {
        let ok = serde_json::to_value(Response::success(json!(1), json!([]))).unwrap();
        assert_eq!(ok, json!({"id": 1, "result": []}));

        let err = Response::failure(json!("a"), ErrorBody::new("not-found", "nope"));
        assert_eq!(
            serde_json::to_value(err).unwrap(),
            json!({"id": "a", "error": {"code": "not-found", "message": "nope"}})
        );
    }

    #[test]
    fn test_models_need_no_auth() {
        assert!(!Method::GetEmbeddingModels.requires_auth());
        assert!(Method::FindSimilarDocuments.requires_auth());
    }
}
