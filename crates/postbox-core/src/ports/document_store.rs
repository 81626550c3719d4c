//! Document store port - the managed document database seen by handlers.

use async_trait::async_trait;

use crate::document::{DocumentSnapshot, Fields};
use crate::error::StoreError;

/// Document store trait - abstraction over document database backends
/// (Redis, in-memory).
///
/// Documents are addressed by collection name + document id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError>;

    /// Read every document of a collection. No ordering guarantee.
    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError>;

    /// Create a document with a store-generated id and return what was committed.
    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentSnapshot, StoreError>;

    /// Create or fully replace the document at `id`.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document, leaving other fields untouched.
    /// Fails with [`StoreError::NotFound`] when the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;

    /// Remove a document and return its last snapshot.
    /// Deleting a missing document is a no-op returning `None`.
    async fn delete(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError>;
}
