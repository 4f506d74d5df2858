//! Admission control for batch runs.
//!
//! A caller may have at most one batch in flight. The permit is released
//! when it is dropped, including when the request task fails.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Tracks which callers currently run a batch.
#[derive(Debug, Default, Clone)]
pub struct BatchAdmission {
    active: Arc<Mutex<HashSet<String>>>,
}

impl BatchAdmission {
    /// Create an empty admission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the batch slot for `user_id`, or `None` if it is taken.
    pub fn try_acquire(&self, user_id: &str) -> Option<BatchPermit> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(user_id.to_string()) {
            debug!("Batch already running for {user_id}");
            return None;
        }
        Some(BatchPermit {
            active: Arc::clone(&self.active),
            user_id: user_id.to_string(),
        })
    }

    /// Number of batches in flight.
    pub fn in_flight(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held while a batch runs.
#[derive(Debug)]
pub struct BatchPermit {
    active: Arc<Mutex<HashSet<String>>>,
    user_id: String,
}

impl Drop for BatchPermit {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user_id);
    }
}
