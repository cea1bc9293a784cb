use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for the word-metadata subsystem.
///
/// Every variant is non-fatal: indexing absorbs `Timeout`/`Superseded` by
/// skipping the affected word, navigation absorbs `NotFound` by clearing the
/// highlight. Nothing here ever aborts an in-progress session.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum WordMetaError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{operation} did not respond within {waited_ms}ms")]
    Timeout { operation: String, waited_ms: u64 },

    #[error("superseded by a newer request")]
    Superseded,

    #[error("invalid import payload: {message}")]
    InvalidInput { message: String },
}

impl WordMetaError {
    pub fn not_found(what: impl Into<String>) -> Self {
        WordMetaError::NotFound { what: what.into() }
    }

    pub fn timeout(operation: &str, waited: std::time::Duration) -> Self {
        WordMetaError::Timeout {
            operation: operation.to_string(),
            waited_ms: waited.as_millis() as u64,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        WordMetaError::InvalidInput {
            message: message.into(),
        }
    }
}
