//! Validated, audited embedding generation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::audit::{AuditLogger, UsageLog, UsageLogEntry};
use crate::auth::{CallerIdentity, require_caller};
use crate::error::{EmbeddingError, Result};
use crate::models::ProviderKind;
use crate::provider::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};

/// Turns text into vectors through an injected provider.
///
/// `embed` checks the input and calls the provider. `generate` additionally
/// requires an authenticated caller and records a usage entry once the
/// embedding is available.
pub struct EmbeddingGenerator {
    provider: Arc<dyn EmbeddingProvider>,
    model: Option<String>,
    audit: Option<AuditLogger>,
}

impl EmbeddingGenerator {
    /// Create a generator backed by `provider`.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            model: None,
            audit: None,
        }
    }

    /// Override the provider's default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Record usage entries to `sink`.
    pub fn with_usage_log(mut self, sink: Arc<dyn UsageLog>) -> Self {
        self.audit = Some(AuditLogger::new(sink));
        self
    }

    /// Name of the backing provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Model used when the request does not name one.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Check text and provider selector without calling the provider.
    pub fn validate(&self, text: &str, selector: Option<&str>) -> Result<ProviderKind> {
        self.check(text, selector).map(|(kind, _)| kind)
    }

    /// Validate and return the provider together with the text length in chars.
    fn check(&self, text: &str, selector: Option<&str>) -> Result<(ProviderKind, usize)> {
        let kind = ProviderKind::resolve(selector)?;

        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "text is required and must be a non-empty string".to_string(),
            ));
        }

        let length = text.chars().count();
        let max_length = self.provider.max_text_length();
        if length > max_length {
            return Err(EmbeddingError::InputTooLong { length, max_length });
        }

        Ok((kind, length))
    }

    /// Embed `text` with no identity check and no audit entry.
    pub async fn embed(&self, text: &str, selector: Option<&str>) -> Result<EmbeddingResponse> {
        let (kind, length) = self.check(text, selector)?;
        self.embed_validated(text, kind, length).await
    }

    async fn embed_validated(
        &self,
        text: &str,
        kind: ProviderKind,
        length: usize,
    ) -> Result<EmbeddingResponse> {
        let mut request = EmbeddingRequest::new(text);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        debug!(provider = %kind, chars = length, "Embedding text");

        let response = self.provider.embed(request).await.map_err(|e| {
            error!(provider = %kind, error = %e, "Embedding provider call failed");
            match e {
                EmbeddingError::Provider(_) => e,
                other => EmbeddingError::Provider(other.to_string()),
            }
        })?;

        let expected = self.provider.default_dimension();
        if response.dimension != expected {
            warn!(
                "Provider {} returned {} dimensions, expected {expected}",
                self.provider.name(),
                response.dimension
            );
        }

        Ok(response)
    }

    /// Embed `text` on behalf of `caller` and record the usage.
    pub async fn generate(
        &self,
        caller: Option<&CallerIdentity>,
        text: &str,
        selector: Option<&str>,
    ) -> Result<EmbeddingResponse> {
        let caller = require_caller(caller)?;
        let (kind, length) = self.check(text, selector)?;
        let response = self.embed_validated(text, kind, length).await?;

        if let Some(audit) = &self.audit {
            audit.submit(UsageLogEntry {
                user_id: caller.user_id.clone(),
                timestamp: Utc::now(),
                text_length: length,
                model: response.model.clone(),
                provider: kind.to_string(),
            });
        }

        Ok(response)
    }

    /// Wait for pending usage writes.
    pub async fn flush_usage_log(&self) {
        if let Some(audit) = &self.audit {
            audit.flush().await;
        }
    }

    /// Number of usage writes that failed.
    pub fn usage_log_failures(&self) -> u64 {
        self.audit.as_ref().map_or(0, AuditLogger::failures)
    }
}
