//! The four embedding operations behind one handle.

use std::sync::Arc;

use mentor_embeddings::{
    CallerIdentity, EmbeddingGenerator, EmbeddingProvider, EmbeddingResponse, ModelDescriptor,
    SimilarityResult, embedding_models,
};
use tracing::info;

use crate::config::RetrievalConfig;
use crate::engine::{SearchRequest, SimilaritySearch};
use crate::error::Result;
use crate::pipeline::{BatchOutcome, BatchPipeline, BatchRequest};
use crate::schema::FieldPolicy;
use crate::store::{CollectionUsageLog, DocumentStore, open_store};

/// Generation, search and batch persistence sharing one provider and store.
///
/// This is the main entry point for callers. Construct it once at startup
/// and share it; it holds no per-request state.
pub struct EmbeddingService {
    generator: Arc<EmbeddingGenerator>,
    search: SimilaritySearch,
    pipeline: BatchPipeline,
    store: Arc<dyn DocumentStore>,
}

impl EmbeddingService {
    /// Create a new service builder.
    pub fn builder(provider: Arc<dyn EmbeddingProvider>) -> EmbeddingServiceBuilder {
        EmbeddingServiceBuilder::new(provider)
    }

    /// Wire the service from `config`, opening the configured store.
    pub async fn new(config: RetrievalConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let store = open_store(&config.store).await?;
        Ok(Self::with_store(config, provider, store))
    }

    /// Wire the service around an existing store.
    pub fn with_store(
        config: RetrievalConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let usage_log = CollectionUsageLog::new(Arc::clone(&store), &config.usage_log_collection);
        let generator = Arc::new(EmbeddingGenerator::new(provider).with_usage_log(Arc::new(usage_log)));
        let fields = FieldPolicy::from(&config.schema);

        let search = SimilaritySearch::new(Arc::clone(&generator), Arc::clone(&store), fields.clone())
            .with_default_limit(config.query.default_limit);
        let pipeline = BatchPipeline::new(Arc::clone(&generator), Arc::clone(&store), fields)
            .with_max_batch_size(config.batch.max_batch_size);

        info!(
            "Embedding service ready (provider: {}, model: {})",
            generator.provider_name(),
            generator.model()
        );

        Self {
            generator,
            search,
            pipeline,
            store,
        }
    }

    /// Embed one text for an authenticated caller.
    pub async fn generate_embedding(
        &self,
        caller: Option<&CallerIdentity>,
        text: &str,
        provider: Option<&str>,
    ) -> Result<EmbeddingResponse> {
        Ok(self.generator.generate(caller, text, provider).await?)
    }

    /// Embed and store a list of texts.
    pub async fn batch_generate_embeddings(
        &self,
        caller: Option<&CallerIdentity>,
        request: &BatchRequest,
    ) -> Result<BatchOutcome> {
        self.pipeline.run(caller, request).await
    }

    /// Rank a collection by similarity to a query.
    pub async fn find_similar_documents(
        &self,
        caller: Option<&CallerIdentity>,
        request: &SearchRequest,
    ) -> Result<Vec<SimilarityResult>> {
        self.search.find_similar(caller, request).await
    }

    /// Describe the available embedding models.
    pub fn embedding_models(&self) -> Vec<ModelDescriptor> {
        embedding_models()
    }

    /// The underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Wait for pending usage log writes.
    pub async fn flush(&self) {
        self.generator.flush_usage_log().await;
    }

    /// Number of usage log writes that failed.
    pub fn usage_log_failures(&self) -> u64 {
        self.generator.usage_log_failures()
    }
}

/// Builder for [`EmbeddingService`].
pub struct EmbeddingServiceBuilder {
    config: RetrievalConfig,
    provider: Arc<dyn EmbeddingProvider>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl EmbeddingServiceBuilder {
    /// Create a new builder.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config: RetrievalConfig::default(),
            provider,
            store: None,
        }
    }

    /// Use `config` instead of the defaults.
    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an already opened store.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the service.
    pub async fn build(self) -> Result<EmbeddingService> {
        match self.store {
            Some(store) => Ok(EmbeddingService::with_store(self.config, self.provider, store)),
            None => EmbeddingService::new(self.config, self.provider).await,
        }
    }
}
