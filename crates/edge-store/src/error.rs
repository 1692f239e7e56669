//! # Error Types
//!
//! Errors surfaced by document store adapters.

use thiserror::Error;

/// Errors that can occur while talking to the document store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// A value could not be converted to or from a document.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A document was not a JSON object.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
