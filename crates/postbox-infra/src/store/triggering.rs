//! Store decorator that fires document triggers after committed writes.

use std::sync::Arc;

use async_trait::async_trait;

use postbox_core::ports::{DocumentStore, TriggerBus};
use postbox_core::{DocumentEvent, DocumentSnapshot, Fields, StoreError};

/// Wraps a store and publishes a `Created` event after every `add` and a
/// `Deleted` event after every `delete` that removed a document.
///
/// Events are published after the write returns; the caller does not wait
/// for trigger execution. A publish failure never fails the write.
pub struct TriggeringStore {
    inner: Arc<dyn DocumentStore>,
    bus: Arc<dyn TriggerBus>,
}

impl TriggeringStore {
    pub fn new(inner: Arc<dyn DocumentStore>, bus: Arc<dyn TriggerBus>) -> Self {
        Self { inner, bus }
    }

    async fn fire(&self, event: DocumentEvent) {
        let key = event.key();
        let document_id = event.document_id().to_string();
        if let Err(e) = self.bus.publish(event).await {
            tracing::error!(
                key = %key,
                document_id = %document_id,
                error = %e,
                "Failed to publish document event"
            );
        }
    }
}

#[async_trait]
impl DocumentStore for TriggeringStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
        self.inner.list(collection).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentSnapshot, StoreError> {
        let snapshot = self.inner.add(collection, fields).await?;
        self.fire(DocumentEvent::created(collection, snapshot.clone()))
            .await;
        Ok(snapshot)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.inner.set(collection, id, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        let removed = self.inner.delete(collection, id).await?;
        if let Some(snapshot) = &removed {
            self.fire(DocumentEvent::deleted(collection, snapshot.clone()))
                .await;
        }
        Ok(removed)
    }
}
