//! Validation of caller-supplied collection and field names.
//!
//! Callers choose which field holds the source text and which holds the
//! vector. Those names are checked against an allow-list so a request can
//! never write into, or read from, unrelated document fields.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::SchemaConfig;
use crate::error::{Result, RetrievalError};

/// Field names the store manages itself.
pub const RESERVED_FIELDS: [&str; 2] = ["id", "createdAt"];

/// Where a record keeps its source text and its vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Field holding the embedded text.
    pub text_field: String,

    /// Field holding the vector.
    pub vector_field: String,
}

/// Allow-list of document fields.
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    allowed: BTreeSet<String>,
}

impl FieldPolicy {
    /// Build a policy from allowed field names. Reserved names are ignored.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed
            .into_iter()
            .map(Into::into)
            .filter(|f: &String| !RESERVED_FIELDS.contains(&f.as_str()))
            .collect();
        Self { allowed }
    }

    /// Check that `name` is an allowed field.
    pub fn field<'a>(&self, name: &'a str, role: &str) -> Result<&'a str> {
        if name.trim().is_empty() {
            return Err(RetrievalError::InvalidInput(format!("{role} is required")));
        }
        if !self.allowed.contains(name) {
            return Err(RetrievalError::InvalidInput(format!(
                "{role} {name:?} is not an allowed field"
            )));
        }
        Ok(name)
    }

    /// Validate a text/vector field pair.
    pub fn mapping(&self, text_field: &str, vector_field: &str) -> Result<FieldMapping> {
        let text_field = self.field(text_field, "fieldToEmbed")?;
        let vector_field = self.field(vector_field, "fieldToStore")?;

        if text_field == vector_field {
            return Err(RetrievalError::InvalidInput(
                "fieldToEmbed and fieldToStore must differ".to_string(),
            ));
        }

        Ok(FieldMapping {
            text_field: text_field.to_string(),
            vector_field: vector_field.to_string(),
        })
    }
}

impl From<&SchemaConfig> for FieldPolicy {
    fn from(config: &SchemaConfig) -> Self {
        Self::new(config.allowed_fields.iter().cloned())
    }
}

/// Check that a collection name is non-empty and path-safe.
pub fn validate_collection(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(RetrievalError::InvalidInput(
            "collection is required".to_string(),
        ));
    }
    if !is_valid_collection_name(name) {
        return Err(RetrievalError::InvalidInput(format!(
            "collection {name:?} may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(name)
}

pub(crate) fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn policy() -> FieldPolicy {
        FieldPolicy::new(["text", "embedding", "createdAt"])
    }

    #[test]
    fn test_valid_mapping() {
        let mapping = policy().mapping("text", "embedding").unwrap();
        assert_eq!(mapping.text_field, "text");
        assert_eq!(mapping.vector_field, "embedding");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = policy().mapping("text", "isAdmin").unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidInput(ref m) if m.contains("isAdmin")));
    }

    #[test]
    fn test_reserved_field_cannot_be_allowed() {
        assert!(policy().field("createdAt", "fieldToStore").is_err());
    }

    #[test]
    fn test_same_field_twice_is_rejected() {
        assert!(policy().mapping("text", "text").is_err());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = policy().field("", "fieldToSearch").unwrap_err();
        assert_eq!(err.to_string(), "invalid input: fieldToSearch is required");
    }

    #[test]
    fn test_collection_names() {
        assert!(validate_collection("quotes").is_ok());
        assert!(validate_collection("quote_vectors-v2").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection("../etc").is_err());
        assert!(validate_collection("a/b").is_err());
    }
}
