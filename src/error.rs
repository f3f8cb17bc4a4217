//! Error handling for the reflection field pipeline.
//!
//! The taxonomy mirrors how failures propagate: precondition and validation
//! errors abort a whole batch before any work happens, while document build
//! and expression errors stay isolated to the single field compilation that
//! raised them. Transform failures never surface here at all; the transform
//! stage degrades to pass-through.

use std::io;
use thiserror::Error;

/// Result type for reflection operations.
pub type ReflectionResult<T> = Result<T, ReflectionError>;

#[derive(Debug, Error)]
pub enum ReflectionError {
    /// A host capability required before any work can start is missing.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Operator-supplied input failed eager validation (batch-fatal).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The context document for an entry could not be assembled.
    /// Fatal for that one field's compilation only.
    #[error("could not build context document: {0}")]
    DocumentBuild(String),

    /// A path expression could not be parsed or evaluated.
    /// Reported for that field; sibling fields continue.
    #[error("expression error: {0}")]
    Expression(String),

    /// Field configuration store errors (install/upgrade/load).
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors from the host record store ports.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ReflectionError {
    /// True for errors that must abort a batch before any entry is touched.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            ReflectionError::Precondition(_) | ReflectionError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_fatal_classification() {
        assert!(ReflectionError::Precondition("no trigger surface".into()).is_batch_fatal());
        assert!(ReflectionError::Validation("unknown handle".into()).is_batch_fatal());
        assert!(!ReflectionError::Expression("bad token".into()).is_batch_fatal());
        assert!(!ReflectionError::DocumentBuild("no section".into()).is_batch_fatal());
    }

    #[test]
    fn display_messages() {
        let err = ReflectionError::Validation("section 'news' does not exist".into());
        assert_eq!(
            err.to_string(),
            "validation failed: section 'news' does not exist"
        );
    }
}
