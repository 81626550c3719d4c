//! Domain-level error types.

use thiserror::Error;

/// Document store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Trigger runtime and trigger handler errors.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unexpected event for trigger: {0}")]
    UnexpectedEvent(String),

    #[error("Failed to publish event: {0}")]
    Publish(String),
}
