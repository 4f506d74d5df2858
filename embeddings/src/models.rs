//! Supported embedding providers and their model catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::provider::{GEMINI_DEFAULT_MODEL, GEMINI_DIMENSION, GEMINI_MAX_TEXT_LENGTH};

/// Providers that can produce embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Google Gemini embeddings API.
    #[default]
    Gemini,
}

impl ProviderKind {
    /// Wire name of the provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
        }
    }

    /// Resolve an optional caller-supplied selector.
    pub fn resolve(selector: Option<&str>) -> Result<Self, EmbeddingError> {
        selector.map_or(Ok(Self::default()), str::parse::<Self>)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            other => Err(EmbeddingError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Static description of an embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Provider selector accepted by `generateEmbedding`.
    pub id: String,

    /// Human readable provider name.
    pub name: String,

    /// Underlying model name.
    pub model: String,

    /// Maximum input length in characters.
    pub max_length: usize,

    /// Output vector dimension.
    pub dimensions: usize,
}

/// All models available for embedding generation.
pub fn embedding_models() -> Vec<ModelDescriptor> {
    vec![ModelDescriptor {
        id: ProviderKind::Gemini.as_str().to_string(),
        name: "Google Gemini".to_string(),
        model: GEMINI_DEFAULT_MODEL.to_string(),
        max_length: GEMINI_MAX_TEXT_LENGTH,
        dimensions: GEMINI_DIMENSION,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_selector_is_gemini() {
        assert_eq!(ProviderKind::resolve(None).unwrap(), ProviderKind::Gemini);
        assert_eq!(
            ProviderKind::resolve(Some(" Gemini ")).unwrap(),
            ProviderKind::Gemini
        );
    }

    #[test]
    fn test_chat_only_provider_is_rejected() {
        let err = ProviderKind::resolve(Some("openai")).unwrap_err();
        assert!(matches!(err, EmbeddingError::UnsupportedProvider(ref p) if p == "openai"));
    }

    #[test]
    fn test_catalog() {
        let models = embedding_models();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "gemini");
        assert_eq!(models[0].max_length, 30_720);
        assert_eq!(models[0].dimensions, 768);

        let value = serde_json::to_value(&models[0]).unwrap();
        assert_eq!(value["maxLength"], 30_720);
    }
}
