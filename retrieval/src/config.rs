//! Configuration for search and batch persistence.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the retrieval layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Where collections are kept.
    pub store: StoreConfig,

    /// Which document fields callers may name.
    pub schema: SchemaConfig,

    /// Query processing configuration.
    pub query: QueryConfig,

    /// Batch write configuration.
    pub batch: BatchConfig,

    /// Collection receiving one usage entry per generated embedding.
    pub usage_log_collection: String,
}

impl RetrievalConfig {
    /// Create a new configuration storing collections under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: StoreConfig {
                data_dir: data_dir.into(),
                ..StoreConfig::default()
            },
            schema: SchemaConfig::default(),
            query: QueryConfig::default(),
            batch: BatchConfig::default(),
            usage_log_collection: "embeddingLogs".to_string(),
        }
    }

    /// Set the store configuration.
    pub fn with_store(mut self, config: StoreConfig) -> Self {
        self.store = config;
        self
    }

    /// Set the query configuration.
    pub fn with_query(mut self, config: QueryConfig) -> Self {
        self.query = config;
        self
    }

    /// Set the batch configuration.
    pub fn with_batch(mut self, config: BatchConfig) -> Self {
        self.batch = config;
        self
    }

    /// Allow an additional document field.
    pub fn allow_field(mut self, field: impl Into<String>) -> Self {
        self.schema.allowed_fields.push(field.into());
        self
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new(StoreConfig::default().data_dir)
    }
}

/// Backend used for collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// JSON files on disk, one per collection.
    #[default]
    File,
    /// Process memory only.
    Memory,
}

/// Configuration for the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to use.
    pub backend: StoreBackend,

    /// Root directory for the file backend.
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            data_dir: dirs::data_dir().unwrap_or_default().join("mentor/collections"),
        }
    }
}

/// Field names callers may use for text and vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Allow-list of document fields.
    pub allowed_fields: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            allowed_fields: ["text", "content", "embedding"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Configuration for query processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Number of results returned when the caller gives no limit.
    pub default_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_limit: 5 }
    }
}

/// Configuration for batch persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Largest number of documents committed in one write.
    pub max_batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
        }
    }
}
