//! Routes decoded requests to the embedding service.

use std::sync::Arc;

use mentor_embeddings::require_caller;
use mentor_retrieval::{BatchRequest, EmbeddingService, RetrievalError, SearchRequest};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::admission::BatchAdmission;
use crate::protocol::{
    ErrorBody, GenerateEmbeddingParams, GenerateEmbeddingResult, Method, Request, Response,
};

/// Failures surfaced to the client.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("invalid params: {0}")]
    InvalidParams(#[source] serde_json::Error),

    #[error("a batch is already running for this caller")]
    BatchInFlight,

    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

impl ProcessError {
    /// Stable, user-safe code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "not-found",
            Self::InvalidParams(_) => "invalid-argument",
            Self::BatchInFlight => "resource-exhausted",
            Self::Encode(_) => "internal",
            Self::Retrieval(e) => e.code(),
        }
    }

    fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.code(), self.to_string())
    }
}

/// Handles one request at a time; shared across request tasks.
pub struct MessageProcessor {
    service: Arc<EmbeddingService>,
    admission: BatchAdmission,
}

impl MessageProcessor {
    /// Create a processor around `service`.
    pub fn new(service: Arc<EmbeddingService>) -> Self {
        Self {
            service,
            admission: BatchAdmission::new(),
        }
    }

    /// The underlying service.
    pub fn service(&self) -> &Arc<EmbeddingService> {
        &self.service
    }

    /// Execute `request` and build its response.
    pub async fn process(&self, request: Request) -> Response {
        let id = request.id.clone();
        let method = request.method.clone();

        match self.dispatch(request).await {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                match &e {
                    ProcessError::Retrieval(_) | ProcessError::Encode(_) => {
                        error!("{method} failed: {e}");
                    }
                    _ => warn!("{method} rejected: {e}"),
                }
                Response::failure(id, e.to_body())
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Value, ProcessError> {
        let method = Method::from_name(&request.method)
            .ok_or_else(|| ProcessError::UnknownMethod(request.method.clone()))?;
        debug!("Dispatching {}", request.method);

        let caller = request.auth.as_ref();
        if method.requires_auth() {
            require_caller(caller).map_err(RetrievalError::from)?;
        }

        match method {
            Method::GenerateEmbedding => {
                let params: GenerateEmbeddingParams = parse_params(request.params)?;
                let response = self
                    .service
                    .generate_embedding(caller, &params.text, params.provider.as_deref())
                    .await?;
                encode(GenerateEmbeddingResult {
                    dimensions: response.embedding.len(),
                    embedding: response.embedding,
                    model: response.model,
                })
            }
            Method::BatchGenerateEmbeddings => {
                let params: BatchRequest = parse_params(request.params)?;
                let user_id = caller.map(|c| c.user_id.as_str()).unwrap_or_default();
                let _permit = self
                    .admission
                    .try_acquire(user_id)
                    .ok_or(ProcessError::BatchInFlight)?;
                let outcome = self
                    .service
                    .batch_generate_embeddings(caller, &params)
                    .await?;
                encode(outcome)
            }
            Method::FindSimilarDocuments => {
                let params: SearchRequest = parse_params(request.params)?;
                let results = self.service.find_similar_documents(caller, &params).await?;
                encode(results)
            }
            Method::GetEmbeddingModels => encode(self.service.embedding_models()),
        }
    }
}

/// Decode method params; a missing `params` reads as an empty object.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ProcessError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(ProcessError::InvalidParams)
}

fn encode(value: impl Serialize) -> Result<Value, ProcessError> {
    serde_json::to_value(value).map_err(ProcessError::Encode)
}
