//! # Embeddings
//!
//! This crate turns text into dense vectors and compares them.
//!
//! ## Features
//!
//! - **Embedding Generation**: Validated calls to an external provider (Gemini)
//! - **Similarity**: Total cosine similarity and stable top-k ranking
//! - **Usage Auditing**: Background usage records that never block a response
//! - **Model Catalog**: Static description of the supported models
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  CallerIdentity ──► EmbeddingGenerator ──► EmbeddingProvider    │
//! │                          │                       │              │
//! │                          ▼                       ▼              │
//! │                     AuditLogger             Gemini API          │
//! │                          │                                      │
//! │                          ▼                                      │
//! │                       UsageLog                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod auth;
pub mod error;
pub mod generator;
pub mod models;
pub mod provider;
pub mod similarity;

pub use audit::{AuditLogger, UsageLog, UsageLogEntry};
pub use auth::{CallerIdentity, require_caller};
pub use error::{EmbeddingError, Result};
pub use generator::EmbeddingGenerator;
pub use models::{ModelDescriptor, ProviderKind, embedding_models};
pub use provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, GeminiProvider};
pub use similarity::{SimilarityResult, cosine_similarity, rank_top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
