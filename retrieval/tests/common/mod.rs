//! Shared fakes for the retrieval integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mentor_embeddings::{EmbeddingError, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use mentor_retrieval::store::StoreResult;
use mentor_retrieval::{Document, DocumentStore, MemoryStore, NewDocument, StorageError};
use tokio::sync::Mutex;

pub const DIMENSION: usize = 2;

/// Provider returning fixed vectors per text and failing on chosen texts.
#[derive(Default)]
pub struct FakeProvider {
    vectors: HashMap<String, Vec<f32>>,
    fail_on: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        "embedding-001"
    }

    fn default_dimension(&self) -> usize {
        DIMENSION
    }

    fn max_text_length(&self) -> usize {
        30_720
    }

    async fn embed(&self, request: EmbeddingRequest) -> mentor_embeddings::Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_on.contains(&request.text) {
            return Err(EmbeddingError::Provider("simulated outage".to_string()));
        }

        let embedding = self
            .vectors
            .get(&request.text)
            .cloned()
            .unwrap_or_else(|| vec![request.text.len() as f32, 1.0]);

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: "embedding-001".to_string(),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Store wrapper that records commit sizes and can fail chosen commits.
pub struct RecordingStore {
    inner: MemoryStore,
    commits: Mutex<Vec<usize>>,
    fail_commits: HashSet<usize>,
    fail_reads: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            commits: Mutex::new(Vec::new()),
            fail_commits: HashSet::new(),
            fail_reads: false,
        }
    }

    /// Fail the commit with this zero-based sequence number.
    pub fn failing_commit(mut self, n: usize) -> Self {
        self.fail_commits.insert(n);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub async fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().await.clone()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        if self.fail_reads {
            return Err(StorageError::Read(format!("{collection}: permission denied")));
        }
        self.inner.list(collection).await
    }

    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<NewDocument>,
    ) -> StoreResult<Vec<String>> {
        let mut commits = self.commits.lock().await;
        let sequence = commits.len();
        commits.push(documents.len());

        if self.fail_commits.contains(&sequence) {
            return Err(StorageError::Write(format!("{collection}: quota exceeded")));
        }
        self.inner.insert_batch(collection, documents).await
    }
}
