//! Usage auditing for embedding calls.
//!
//! Audit writes run as background tasks. A failed write is logged and
//! counted but never surfaces to the caller whose embedding was computed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::Result;

/// One audit record per generated embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogEntry {
    /// Caller that requested the embedding.
    pub user_id: String,

    /// When the embedding was produced.
    pub timestamp: DateTime<Utc>,

    /// Length of the embedded text, in characters.
    pub text_length: usize,

    /// Model that produced the embedding.
    pub model: String,

    /// Provider that produced the embedding.
    pub provider: String,
}

/// Destination for usage audit entries.
#[async_trait]
pub trait UsageLog: Send + Sync {
    /// Persist one entry.
    async fn record(&self, entry: UsageLogEntry) -> Result<()>;
}

/// Writes usage entries off the request path.
pub struct AuditLogger {
    sink: Arc<dyn UsageLog>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    failures: Arc<AtomicU64>,
}

impl AuditLogger {
    /// Create a logger writing to `sink`.
    pub fn new(sink: Arc<dyn UsageLog>) -> Self {
        Self {
            sink,
            pending: Mutex::new(Vec::new()),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedule an entry to be written. Returns immediately.
    pub fn submit(&self, entry: UsageLogEntry) {
        let sink = Arc::clone(&self.sink);
        let failures = Arc::clone(&self.failures);

        let handle = tokio::spawn(async move {
            let user_id = entry.user_id.clone();
            match sink.record(entry).await {
                Ok(()) => debug!(%user_id, "Recorded embedding usage"),
                Err(e) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    error!(%user_id, error = %e, "Failed to record embedding usage");
                }
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Wait for every scheduled write to finish.
    pub async fn flush(&self) {
        let handles: Vec<_> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).collect()
        };

        for handle in handles {
            if let Err(e) = handle.await {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Usage log task aborted");
            }
        }
    }

    /// Number of audit writes that failed since startup.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
