//! Similarity computation for embeddings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical direction
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
///
/// Never fails: mismatched lengths, zero vectors and non-finite results
/// score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    let score = dot_product / (magnitude_a * magnitude_b);
    if score.is_finite() { score } else { 0.0 }
}

/// Sort scored items by descending score and keep the first `k`.
///
/// The sort is stable, so items with equal scores keep their input order.
pub fn rank_top_k<T>(mut scored: Vec<(T, f32)>, k: usize) -> Vec<(T, f32)> {
    scored.sort_by(|a, b| OrderedFloat(b.1).cmp(&OrderedFloat(a.1)));
    scored.truncate(k);
    scored
}

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// ID of the matched record.
    pub id: String,

    /// Cosine similarity to the query.
    pub score: f32,

    /// The matched record's stored fields.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            fields: serde_json::Map::new(),
        }
    }

    /// Attach the record's fields to the result.
    pub fn with_fields(mut self, fields: serde_json::Map<String, serde_json::Value>) -> Self {
        self.fields = fields;
        self
    }
}
