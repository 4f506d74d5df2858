//! Embedding providers.
//!
//! The provider is the only component that talks to the outside world. It is
//! injected into the generator as `Arc<dyn EmbeddingProvider>` so tests can
//! substitute a fake.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Default Gemini API endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini embedding model.
pub const GEMINI_DEFAULT_MODEL: &str = "embedding-001";

/// Output dimension of the Gemini embedding models.
pub const GEMINI_DIMENSION: usize = 768;

/// Maximum input length, in characters, accepted for Gemini embeddings.
pub const GEMINI_MAX_TEXT_LENGTH: usize = 30_720;

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Longest input, in characters, the provider accepts.
    fn max_text_length(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Google Gemini embedding provider.
pub struct GeminiProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Per-request timeout.
    timeout: Duration,
}

impl GeminiProvider {
    /// Create a new Gemini provider with no API key configured.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: GEMINI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            default_model: GEMINI_DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_model_name(model: &str) -> &str {
        model.strip_prefix("models/").unwrap_or(model)
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        GEMINI_DIMENSION
    }

    fn max_text_length(&self) -> usize {
        GEMINI_MAX_TEXT_LENGTH
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::Provider("API key not configured".to_string()))?;

        let model = request.model.unwrap_or_else(|| self.default_model.clone());
        let model = Self::api_model_name(&model).to_string();

        debug!("Generating embedding with model: {model}");

        let body = serde_json::json!({
            "model": format!("models/{model}"),
            "content": { "parts": [{ "text": request.text }] }
        });

        let response = self
            .client
            .post(format!("{}/v1beta/models/{model}:embedContent", self.base_url))
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::Provider(format!(
                "rate limit exceeded, retry after {retry_after}s"
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let result: GeminiEmbedResponse = response.json().await?;
        let embedding = result.embedding.values;

        if embedding.is_empty() {
            return Err(EmbeddingError::Provider(
                "no embedding values in response".to_string(),
            ));
        }

        let dimension = embedding.len();
        info!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model,
            dimension,
        })
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Gemini `embedContent` response format.
#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
    }

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Hello world").with_model("text-embedding-004");

        assert_eq!(request.text, "Hello world");
        assert_eq!(request.model, Some("text-embedding-004".to_string()));
    }

    #[test]
    fn test_blank_api_key_is_unavailable() {
        let provider = GeminiProvider::new().with_api_key("   ");
        assert!(!provider.is_available());
    }

    #[tokio::test]
    async fn test_embed_parses_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/embedding-001:embedContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": { "values": [0.1, 0.2, 0.3] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .embed(EmbeddingRequest::new("wisdom"))
            .await
            .unwrap();

        assert_eq!(response.embedding, vec![0.1, 0.2, 0.3]);
        assert_eq!(response.dimension, 3);
        assert_eq!(response.model, "embedding-001");
    }

    #[tokio::test]
    async fn test_model_prefix_is_stripped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-embedding-004:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": { "values": [1.0] }
            })))
            .mount(&server)
            .await;

        let response = provider_for(&server)
            .embed(EmbeddingRequest::new("x").with_model("models/text-embedding-004"))
            .await
            .unwrap();

        assert_eq!(response.model, "text-embedding-004");
    }

    #[tokio::test]
    async fn test_api_error_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .embed(EmbeddingRequest::new("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Provider(ref msg) if msg.contains("backend exploded")));
    }

    #[tokio::test]
    async fn test_rate_limit_reports_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .embed(EmbeddingRequest::new("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, EmbeddingError::Provider(ref msg) if msg.contains("retry after 7s")));
    }

    #[tokio::test]
    async fn test_malformed_response_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "unexpected": true
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .embed(EmbeddingRequest::new("x"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "provider-error");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new().with_base_url(server.uri());
        let err = provider.embed(EmbeddingRequest::new("x")).await.unwrap_err();

        assert!(matches!(err, EmbeddingError::Provider(_)));
    }
}
