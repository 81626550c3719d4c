//! Trigger bus port - delivers document events to registered callbacks.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::document::{DocumentEvent, DocumentEventKind};
use crate::error::TriggerError;

/// Callback invoked with each matching event.
pub type TriggerHandler =
    Arc<dyn Fn(DocumentEvent) -> BoxFuture<'static, Result<(), TriggerError>> + Send + Sync>;

/// A callback registered against `(collection, kind)`.
#[derive(Clone)]
pub struct TriggerSubscription {
    /// Name used in the trigger-execution log.
    pub name: String,
    pub collection: String,
    pub kind: DocumentEventKind,
    pub handler: TriggerHandler,
}

impl TriggerSubscription {
    pub fn new<F>(
        name: impl Into<String>,
        collection: impl Into<String>,
        kind: DocumentEventKind,
        handler: F,
    ) -> Self
    where
        F: Fn(DocumentEvent) -> BoxFuture<'static, Result<(), TriggerError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            collection: collection.into(),
            kind,
            handler: Arc::new(handler),
        }
    }
}

impl std::fmt::Debug for TriggerSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerSubscription")
            .field("name", &self.name)
            .field("collection", &self.collection)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Trigger bus trait - abstraction over event delivery backends.
#[async_trait]
pub trait TriggerBus: Send + Sync {
    /// Deliver an event to the trigger registered for its key, if any.
    async fn publish(&self, event: DocumentEvent) -> Result<(), TriggerError>;

    /// Register a trigger. A later subscription on the same key replaces it.
    async fn subscribe(&self, subscription: TriggerSubscription) -> Result<(), TriggerError>;

    /// Remove the trigger registered for `(collection, kind)`.
    async fn unsubscribe(&self, collection: &str, kind: DocumentEventKind)
    -> Result<(), TriggerError>;
}
