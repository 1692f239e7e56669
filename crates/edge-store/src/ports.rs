//! # Outbound Port (Driven Port)
//!
//! The document store interface the edge fabric requires from its host.
//!
//! Production: any document database behind this trait.
//! Testing: [`InMemoryDocumentStore`](crate::InMemoryDocumentStore).

use crate::error::StoreError;
use crate::query::{Document, Filter, FindOptions, Patch, Pipeline};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Abstract interface for document database operations.
///
/// Implementations must be safe for concurrent use; callers share one
/// instance behind an `Arc` and never lock around it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document into a collection, creating the collection if needed.
    async fn insert(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// Find documents matching a filter, with ordering and limit.
    async fn find_with(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Apply a patch to the first document matching the filter.
    ///
    /// Returns the matched count (0 or 1).
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<u64, StoreError>;

    /// Delete the first document matching the filter.
    ///
    /// Returns the deleted count (0 or 1).
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Run an aggregation pipeline over a collection.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<Vec<Document>, StoreError>;

    /// Count documents matching a filter.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Find every document matching a filter, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.find_with(collection, filter, &FindOptions::default())
            .await
    }

    /// Find the first document matching a filter.
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let mut docs = self
            .find_with(collection, filter, &FindOptions::limit(1))
            .await?;
        Ok(docs.pop())
    }
}

/// Convert a serializable value into a document.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "expected object, got {}",
            other
        ))),
    }
}

/// Decode a document into a typed entity.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(serde_json::Value::Object(doc))?)
}
