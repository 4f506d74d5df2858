//! Caller identity supplied by the invocation layer.

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Stable user identifier.
    pub user_id: String,
}

impl CallerIdentity {
    /// Create a caller identity.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Reject anonymous callers before any work is attempted.
pub fn require_caller(caller: Option<&CallerIdentity>) -> Result<&CallerIdentity> {
    match caller {
        Some(caller) if !caller.user_id.trim().is_empty() => Ok(caller),
        _ => Err(EmbeddingError::AuthenticationRequired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_caller_is_rejected() {
        assert!(matches!(
            require_caller(None),
            Err(EmbeddingError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_blank_user_id_is_rejected() {
        let caller = CallerIdentity::new("  ");
        assert!(require_caller(Some(&caller)).is_err());
    }

    #[test]
    fn test_authenticated_caller_passes() {
        let caller = CallerIdentity::new("uid-42");
        assert_eq!(require_caller(Some(&caller)).unwrap().user_id, "uid-42");
    }
}
