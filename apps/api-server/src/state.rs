//! Application state - shared across all handlers.

use std::sync::Arc;

use postbox_core::ports::{DocumentStore, TriggerBus};
use postbox_core::triggers::post_triggers;
use postbox_core::{StoreError, TriggerError};
use postbox_infra::{InMemoryDocumentStore, InMemoryTriggerBus, TriggerBusConfig, TriggeringStore};

use crate::config::{AppConfig, Collections, StoreBackend};

#[cfg(feature = "redis")]
use postbox_infra::RedisDocumentStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Store handle that fires document triggers on add/delete.
    pub store: Arc<dyn DocumentStore>,
    pub collections: Collections,
    /// Backend label reported by the health check.
    pub backend: &'static str,
}

/// Failures while wiring the application together.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("document store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("trigger registration failed: {0}")]
    Trigger(#[from] TriggerError),
}

impl AppState {
    /// Build the application state with the configured store backend.
    pub async fn from_config(
        config: &AppConfig,
    ) -> Result<(Self, Arc<InMemoryTriggerBus>), StartupError> {
        let (backend, label) = document_backend(&config.store).await?;
        let (state, bus) = Self::with_triggers(
            backend,
            config.collections.clone(),
            config.triggers.clone(),
        )
        .await?;

        tracing::info!(
            backend = label,
            posts = %state.collections.posts,
            archive = %state.collections.archive,
            "Application state initialized"
        );

        Ok((Self { backend: label, ..state }, bus))
    }

    /// Wrap `backend` so that adds and deletes fire the post triggers, and
    /// register both triggers on a fresh bus.
    pub async fn with_triggers(
        backend: Arc<dyn DocumentStore>,
        collections: Collections,
        bus_config: TriggerBusConfig,
    ) -> Result<(Self, Arc<InMemoryTriggerBus>), TriggerError> {
        let bus = Arc::new(InMemoryTriggerBus::new(bus_config));
        let store: Arc<dyn DocumentStore> =
            Arc::new(TriggeringStore::new(backend, bus.clone()));

        for trigger in post_triggers(store.clone(), &collections.posts, &collections.archive) {
            bus.subscribe(trigger).await?;
        }

        let state = Self {
            store,
            collections,
            backend: "custom",
        };
        Ok((state, bus))
    }
}

async fn document_backend(
    backend: &StoreBackend,
) -> Result<(Arc<dyn DocumentStore>, &'static str), StoreError> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store. Data is lost on restart.");
            Ok((Arc::new(InMemoryDocumentStore::new()), "memory"))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis(config) => match RedisDocumentStore::new(config.clone()).await {
            Ok(store) => Ok((Arc::new(store), "redis")),
            Err(e) if config.fallback_to_memory => {
                tracing::error!(
                    "Failed to connect to Redis: {}. Using in-memory fallback.",
                    e
                );
                Ok((Arc::new(InMemoryDocumentStore::new()), "memory"))
            }
            Err(e) => Err(e),
        },
    }
}
