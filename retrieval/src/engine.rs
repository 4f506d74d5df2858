//! Brute-force similarity search over a collection.

use std::sync::Arc;

use mentor_embeddings::{
    CallerIdentity, EmbeddingGenerator, SimilarityResult, cosine_similarity, rank_top_k,
    require_caller,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{Result, RetrievalError};
use crate::schema::{FieldPolicy, validate_collection};
use crate::store::DocumentStore;

/// Parameters of a similarity search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Text to search for.
    #[serde(default)]
    pub query: String,

    /// Collection to scan.
    #[serde(default)]
    pub collection: String,

    /// Field holding the stored vectors.
    #[serde(default)]
    pub field_to_search: String,

    /// Maximum number of results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl SearchRequest {
    /// Create a search request with the default limit.
    pub fn new(
        query: impl Into<String>,
        collection: impl Into<String>,
        field_to_search: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            collection: collection.into(),
            field_to_search: field_to_search.into(),
            limit: None,
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Finds the stored records closest to a query text.
///
/// Every search embeds the query and then scores every document of the
/// collection. There is no index; the scan is linear in collection size.
pub struct SimilaritySearch {
    generator: Arc<EmbeddingGenerator>,
    store: Arc<dyn DocumentStore>,
    fields: FieldPolicy,
    default_limit: usize,
}

impl SimilaritySearch {
    /// Create a search engine.
    pub fn new(
        generator: Arc<EmbeddingGenerator>,
        store: Arc<dyn DocumentStore>,
        fields: FieldPolicy,
    ) -> Self {
        Self {
            generator,
            store,
            fields,
            default_limit: 5,
        }
    }

    /// Set the limit used when a request gives none.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    /// Rank the documents of a collection by similarity to the query.
    pub async fn find_similar(
        &self,
        caller: Option<&CallerIdentity>,
        request: &SearchRequest,
    ) -> Result<Vec<SimilarityResult>> {
        require_caller(caller)?;

        if request.query.trim().is_empty() {
            return Err(RetrievalError::InvalidInput("query is required".to_string()));
        }
        let collection = validate_collection(&request.collection)?;
        let field = self.fields.field(&request.field_to_search, "fieldToSearch")?;
        let limit = self.resolve_limit(request.limit)?;

        let query = self.generator.embed(&request.query, None).await?;

        let documents = self.store.list(collection).await.map_err(|e| {
            error!("Failed to read collection {collection}: {e}");
            RetrievalError::Storage(e)
        })?;

        let total = documents.len();
        let scored: Vec<_> = documents
            .into_iter()
            .filter_map(|doc| {
                let vector = stored_vector(doc.fields.get(field)?)?;
                if vector.len() != query.embedding.len() {
                    return None;
                }
                let score = cosine_similarity(&query.embedding, &vector);
                Some((doc, score))
            })
            .collect();

        debug!(
            "Scored {} of {total} documents in {collection}",
            scored.len()
        );

        let results: Vec<SimilarityResult> = rank_top_k(scored, limit)
            .into_iter()
            .map(|(doc, score)| {
                let fields = doc.display_fields();
                SimilarityResult::new(doc.id, score).with_fields(fields)
            })
            .collect();

        info!(
            "Found {} similar documents in {collection} (limit {limit})",
            results.len()
        );
        Ok(results)
    }

    fn resolve_limit(&self, limit: Option<i64>) -> Result<usize> {
        match limit {
            None => Ok(self.default_limit),
            Some(n) if n > 0 => usize::try_from(n)
                .map_err(|_| RetrievalError::InvalidInput(format!("limit {n} is too large"))),
            Some(n) => Err(RetrievalError::InvalidInput(format!(
                "limit must be a positive integer, got {n}"
            ))),
        }
    }
}

/// Decode a stored vector. Anything other than a non-empty array of numbers
/// is treated as "no vector".
fn stored_vector(value: &Value) -> Option<Vec<f32>> {
    let values = value.as_array()?;
    if values.is_empty() {
        return None;
    }
    values
        .iter()
        .map(|v| v.as_f64().map(|x| x as f32))
        .collect()
}
