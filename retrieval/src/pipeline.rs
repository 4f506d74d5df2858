//! Batch embedding and persistence.
//!
//! Texts are embedded one at a time in input order and queued for writing.
//! The queue is committed whenever it reaches the batch size and once more at
//! the end. A failing text or a failing commit is recorded in the per-item
//! results and the run carries on.

use std::sync::Arc;

use mentor_embeddings::{CallerIdentity, EmbeddingGenerator, require_caller};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Result, RetrievalError};
use crate::schema::{FieldMapping, FieldPolicy, validate_collection};
use crate::store::{DocumentStore, NewDocument};

/// Parameters of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    /// Texts to embed, in order. Items that are not strings fail
    /// individually.
    #[serde(default)]
    pub texts: Option<Vec<Value>>,

    /// Collection receiving the new documents.
    #[serde(default)]
    pub collection: String,

    /// Field that stores the source text.
    #[serde(default)]
    pub field_to_embed: String,

    /// Field that stores the vector.
    #[serde(default)]
    pub field_to_store: String,
}

impl BatchRequest {
    /// Create a batch request.
    pub fn new(
        texts: Vec<String>,
        collection: impl Into<String>,
        field_to_embed: impl Into<String>,
        field_to_store: impl Into<String>,
    ) -> Self {
        Self {
            texts: Some(texts.into_iter().map(Value::String).collect()),
            collection: collection.into(),
            field_to_embed: field_to_embed.into(),
            field_to_store: field_to_store.into(),
        }
    }
}

/// Outcome for one input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemResult {
    /// The input text.
    pub text: String,

    /// Whether the text was embedded and committed.
    pub success: bool,

    /// Why the item failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    fn succeeded(text: &str) -> Self {
        Self {
            text: text.to_string(),
            success: true,
            error: None,
        }
    }

    fn failed(text: &str, error: impl Into<String>) -> Self {
        Self {
            text: text.to_string(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result of a batch run.
///
/// `success` means the run completed; inspect `results` for per-item status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// The run reached the end of the input.
    pub success: bool,

    /// Number of texts attempted.
    pub processed: usize,

    /// Per-text outcomes, in input order.
    pub results: Vec<BatchItemResult>,
}

impl BatchOutcome {
    /// Number of items that were stored.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

/// Queued writes waiting for the next commit.
struct PendingBatch {
    indices: Vec<usize>,
    documents: Vec<NewDocument>,
}

impl PendingBatch {
    fn new() -> Self {
        Self {
            indices: Vec::new(),
            documents: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.documents.len()
    }

    fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn push(&mut self, index: usize, document: NewDocument) {
        self.indices.push(index);
        self.documents.push(document);
    }
}

/// Embeds texts and stores them as new documents.
pub struct BatchPipeline {
    generator: Arc<EmbeddingGenerator>,
    store: Arc<dyn DocumentStore>,
    fields: FieldPolicy,
    max_batch_size: usize,
}

impl BatchPipeline {
    /// Create a pipeline.
    pub fn new(
        generator: Arc<EmbeddingGenerator>,
        store: Arc<dyn DocumentStore>,
        fields: FieldPolicy,
    ) -> Self {
        Self {
            generator,
            store,
            fields,
            max_batch_size: 100,
        }
    }

    /// Set the largest number of documents per commit.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    /// Embed and persist every text of `request`.
    pub async fn run(
        &self,
        caller: Option<&CallerIdentity>,
        request: &BatchRequest,
    ) -> Result<BatchOutcome> {
        require_caller(caller)?;

        let texts = request
            .texts
            .as_ref()
            .ok_or_else(|| RetrievalError::InvalidInput("texts is required".to_string()))?;
        let collection = validate_collection(&request.collection)?;
        let mapping = self
            .fields
            .mapping(&request.field_to_embed, &request.field_to_store)?;

        info!(
            "Starting batch of {} texts into {collection}",
            texts.len()
        );

        let mut results = Vec::with_capacity(texts.len());
        let mut pending = PendingBatch::new();

        for item in texts {
            let Some(text) = item.as_str() else {
                warn!("Skipping non-string batch item: {item}");
                results.push(BatchItemResult::failed(
                    &item.to_string(),
                    RetrievalError::InvalidInput("text must be a string".to_string()).to_string(),
                ));
                continue;
            };

            match self.generator.embed(text, None).await {
                Ok(response) => {
                    pending.push(results.len(), to_document(&mapping, text, response.embedding));
                    results.push(BatchItemResult::succeeded(text));

                    if pending.len() >= self.max_batch_size {
                        let full = std::mem::replace(&mut pending, PendingBatch::new());
                        self.commit(collection, full, &mut results).await;
                    }
                }
                Err(e) => {
                    warn!("Error processing text: {e}");
                    results.push(BatchItemResult::failed(text, e.to_string()));
                }
            }
        }

        if !pending.is_empty() {
            self.commit(collection, pending, &mut results).await;
        }

        let outcome = BatchOutcome {
            success: true,
            processed: texts.len(),
            results,
        };

        info!(
            "Batch into {collection} finished: {}/{} stored",
            outcome.succeeded(),
            outcome.processed
        );
        Ok(outcome)
    }

    async fn commit(&self, collection: &str, batch: PendingBatch, results: &mut [BatchItemResult]) {
        let size = batch.len();
        match self.store.insert_batch(collection, batch.documents).await {
            Ok(_) => debug!("Committed {size} documents to {collection}"),
            Err(e) => {
                error!("Failed to commit {size} documents to {collection}: {e}");
                let message = RetrievalError::Storage(e).to_string();
                for index in batch.indices {
                    results[index].success = false;
                    results[index].error = Some(message.clone());
                }
            }
        }
    }
}

fn to_document(mapping: &FieldMapping, text: &str, vector: Vec<f32>) -> NewDocument {
    NewDocument::new()
        .with_field(mapping.text_field.clone(), Value::String(text.to_string()))
        .with_field(mapping.vector_field.clone(), vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_without_texts_deserializes() {
        let request: BatchRequest = serde_json::from_value(serde_json::json!({
            "collection": "quotes",
            "fieldToEmbed": "text",
            "fieldToStore": "embedding"
        }))
        .unwrap();
        assert_eq!(request.texts, None);
    }

    #[test]
    fn test_item_result_wire_format() {
        let ok = serde_json::to_value(BatchItemResult::succeeded("a")).unwrap();
        assert_eq!(ok, serde_json::json!({"text": "a", "success": true}));

        let failed = serde_json::to_value(BatchItemResult::failed("b", "boom")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"text": "b", "success": false, "error": "boom"})
        );
    }

    #[test]
    fn test_document_layout() {
        let mapping = FieldMapping {
            text_field: "content".to_string(),
            vector_field: "embedding".to_string(),
        };
        let doc = to_document(&mapping, "Carpe diem", vec![1.0, 0.0]);
        assert_eq!(doc.fields["content"], Value::from("Carpe diem"));
        assert_eq!(doc.fields["embedding"], serde_json::json!([1.0, 0.0]));
    }
}
