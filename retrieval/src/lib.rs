//! # Retrieval
//!
//! Persistence and similarity search on top of `mentor-embeddings`:
//!
//! - **Document Store**: Named, append-only collections (memory or JSON files)
//! - **Similarity Search**: Brute-force cosine ranking of a collection
//! - **Batch Pipeline**: Sequential embedding with batched, failure-isolated writes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      EmbeddingService                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │  Embedding   │  │  Similarity  │  │    Batch     │          │
//! │  │  Generator   │◄─┤    Search    │  │   Pipeline   ├──┐       │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────┘  │       │
//! │         │                 │                              │       │
//! │         ▼                 ▼                              │       │
//! │  ┌──────────────┐  ┌──────────────┐                      │       │
//! │  │  Usage Log   │─►│ DocumentStore│◄─────────────────────┘       │
//! │  └──────────────┘  └──────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mentor_retrieval::{EmbeddingService, SearchRequest};
//!
//! let service = EmbeddingService::builder(provider)
//!     .with_config(config)
//!     .build()
//!     .await?;
//!
//! let request = SearchRequest::new("courage", "quotes", "embedding").with_limit(3);
//! let results = service.find_similar_documents(Some(&caller), &request).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod file_store;
pub mod pipeline;
pub mod schema;
pub mod service;
pub mod store;

pub use config::RetrievalConfig;
pub use engine::{SearchRequest, SimilaritySearch};
pub use error::{Result, RetrievalError, StorageError};
pub use file_store::JsonFileStore;
pub use pipeline::{BatchItemResult, BatchOutcome, BatchPipeline, BatchRequest};
pub use schema::{FieldMapping, FieldPolicy};
pub use service::{EmbeddingService, EmbeddingServiceBuilder};
pub use store::{Document, DocumentStore, MemoryStore, NewDocument, open_store};

// Re-export from dependencies for convenience
pub use mentor_embeddings::{
    CallerIdentity, EmbeddingError, EmbeddingProvider, ModelDescriptor, SimilarityResult,
};
