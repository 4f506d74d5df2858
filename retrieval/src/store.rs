//! Document collections.
//!
//! A collection is a named, schema-flexible list of documents. The store
//! assigns each document an id and a creation timestamp; documents are never
//! updated afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mentor_embeddings::{EmbeddingError, UsageLog, UsageLogEntry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StorageError;
use crate::file_store::JsonFileStore;
use crate::schema::is_valid_collection_name;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// A persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Store-assigned identifier.
    pub id: String,

    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,

    /// Caller-defined fields.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Assign identity and timestamp to a new document.
    pub fn from_new(document: NewDocument, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            fields: document.fields,
        }
    }

    /// All fields including `createdAt`, as shown to callers.
    pub fn display_fields(&self) -> Map<String, Value> {
        let mut fields = self.fields.clone();
        fields.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        fields
    }
}

/// A document that has not been written yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    /// Caller-defined fields.
    pub fields: Map<String, Value>,
}

impl NewDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Storage backend for document collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of a collection, in insertion order.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Write documents in one all-or-nothing commit and return their ids.
    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<String>>;

    /// Number of documents in a collection.
    async fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.list(collection).await?.len())
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<String>> {
        if !is_valid_collection_name(collection) {
            return Err(StorageError::InvalidCollection(collection.to_string()));
        }

        let now = Utc::now();
        let documents: Vec<Document> = documents
            .into_iter()
            .map(|d| Document::from_new(d, now))
            .collect();
        let ids = documents.iter().map(|d| d.id.clone()).collect();

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);

        debug!("Committed batch to in-memory collection {collection}");
        Ok(ids)
    }

    async fn count(&self, collection: &str) -> StoreResult<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }
}

/// Usage log that appends entries to a store collection.
pub struct CollectionUsageLog {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CollectionUsageLog {
    /// Write entries into `collection` of `store`.
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl UsageLog for CollectionUsageLog {
    async fn record(&self, entry: UsageLogEntry) -> mentor_embeddings::Result<()> {
        let fields = match serde_json::to_value(&entry) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(EmbeddingError::StorageUnavailable(e.to_string())),
        };

        self.store
            .insert_batch(&self.collection, vec![NewDocument { fields }])
            .await?;
        Ok(())
    }
}

/// Open the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::File => {
            info!("Using file document store at {}", config.data_dir.display());
            Ok(Arc::new(JsonFileStore::new(&config.data_dir).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_insert_assigns_ids_and_keeps_order() {
        let store = MemoryStore::new();
        let ids = store
            .insert_batch(
                "quotes",
                vec![
                    NewDocument::new().with_field("text", "first"),
                    NewDocument::new().with_field("text", "second"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let docs = store.list("quotes").await.unwrap();
        let texts: Vec<_> = docs.iter().map(|d| d.fields["text"].clone()).collect();
        assert_eq!(texts, vec![Value::from("first"), Value::from("second")]);
        assert_eq!(docs[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.list("nothing").await.unwrap().is_empty());
        assert_eq!(store.count("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_collection_is_rejected() {
        let store = MemoryStore::new();
        let result = store.insert_batch("../x", vec![NewDocument::new()]).await;
        assert!(matches!(result, Err(StorageError::InvalidCollection(_))));
    }

    #[tokio::test]
    async fn test_usage_log_writes_entry() {
        let store = Arc::new(MemoryStore::new());
        let log = CollectionUsageLog::new(store.clone(), "embeddingLogs");

        log.record(UsageLogEntry {
            user_id: "u1".to_string(),
            timestamp: Utc::now(),
            text_length: 3,
            model: "embedding-001".to_string(),
            provider: "gemini".to_string(),
        })
        .await
        .unwrap();

        let docs = store.list("embeddingLogs").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["userId"], Value::from("u1"));
        assert_eq!(docs[0].fields["textLength"], Value::from(3));
    }

    #[test]
    fn test_display_fields_include_created_at() {
        let doc = Document::from_new(NewDocument::new().with_field("text", "x"), Utc::now());
        let fields = doc.display_fields();
        assert!(fields.contains_key("createdAt"));
        assert_eq!(fields["text"], Value::from("x"));
    }
}
