//! In-memory trigger bus.
//!
//! Plays the hosting platform for triggers: one queue per registered
//! `(collection, kind)` key, every delivered event handled in its own task.
//! Works within a single process only.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};

use postbox_core::document::trigger_key;
use postbox_core::ports::{TriggerBus, TriggerHandler, TriggerSubscription};
use postbox_core::{DocumentEvent, DocumentEventKind, TriggerError};

/// Trigger bus configuration.
#[derive(Debug, Clone)]
pub struct TriggerBusConfig {
    /// Pending events per trigger before `publish` waits.
    pub queue_size: usize,
    /// Invocations per event, including the first (1 = no retry).
    pub max_attempts: u32,
    /// Backoff unit between attempts, multiplied by the attempt number.
    pub retry_backoff: Duration,
}

impl Default for TriggerBusConfig {
    fn default() -> Self {
        Self {
            queue_size: 1024,
            max_attempts: 1,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

impl TriggerBusConfig {
    pub fn from_env() -> Self {
        Self {
            queue_size: std::env::var("TRIGGER_QUEUE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024),
            max_attempts: std::env::var("TRIGGER_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            retry_backoff: Duration::from_millis(
                std::env::var("TRIGGER_RETRY_BACKOFF_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
            ),
        }
    }
}

/// Trigger execution counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerStats {
    pub published: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Counters {
    published: AtomicUsize,
    running: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// In-memory trigger bus.
pub struct InMemoryTriggerBus {
    routes: Arc<RwLock<HashMap<String, mpsc::Sender<DocumentEvent>>>>,
    counters: Arc<Counters>,
    config: TriggerBusConfig,
}

impl InMemoryTriggerBus {
    pub fn new(config: TriggerBusConfig) -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
            config,
        }
    }

    pub fn stats(&self) -> TriggerStats {
        TriggerStats {
            published: self.counters.published.load(Ordering::Relaxed),
            running: self.counters.running.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// True once every published event has finished, successfully or not.
    pub fn is_idle(&self) -> bool {
        let stats = self.stats();
        stats.completed + stats.failed == stats.published
    }
}

impl Default for InMemoryTriggerBus {
    fn default() -> Self {
        Self::new(TriggerBusConfig::default())
    }
}

#[async_trait]
impl TriggerBus for InMemoryTriggerBus {
    async fn publish(&self, event: DocumentEvent) -> Result<(), TriggerError> {
        let key = event.key();
        let sender = self.routes.read().await.get(&key).cloned();

        let Some(sender) = sender else {
            tracing::debug!(key = %key, "No trigger registered");
            return Ok(());
        };

        self.counters.published.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = sender.send(event).await {
            self.counters.published.fetch_sub(1, Ordering::Relaxed);
            return Err(TriggerError::Publish(e.to_string()));
        }

        tracing::debug!(key = %key, "Event published");
        Ok(())
    }

    async fn subscribe(&self, subscription: TriggerSubscription) -> Result<(), TriggerError> {
        let TriggerSubscription {
            name,
            collection,
            kind,
            handler,
        } = subscription;
        let key = trigger_key(&collection, kind);

        let (tx, mut rx) = mpsc::channel::<DocumentEvent>(self.config.queue_size.max(1));
        let invocation = Invocation {
            name: Arc::from(name.as_str()),
            handler,
            counters: self.counters.clone(),
            max_attempts: self.config.max_attempts.max(1),
            retry_backoff: self.config.retry_backoff,
        };

        let worker_key = key.clone();
        tokio::spawn(async move {
            tracing::info!(trigger = %invocation.name, key = %worker_key, "Trigger registered");

            while let Some(event) = rx.recv().await {
                let invocation = invocation.clone();
                tokio::spawn(async move { invocation.run(event).await });
            }

            tracing::info!(trigger = %invocation.name, key = %worker_key, "Trigger removed");
        });

        // Replacing the sender closes the previous trigger's queue
        self.routes.write().await.insert(key, tx);
        Ok(())
    }

    async fn unsubscribe(
        &self,
        collection: &str,
        kind: DocumentEventKind,
    ) -> Result<(), TriggerError> {
        self.routes
            .write()
            .await
            .remove(&trigger_key(collection, kind));
        Ok(())
    }
}

/// A single trigger's handler plus the platform retry policy.
#[derive(Clone)]
struct Invocation {
    name: Arc<str>,
    handler: TriggerHandler,
    counters: Arc<Counters>,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl Invocation {
    async fn run(&self, event: DocumentEvent) {
        let key = event.key();
        let document_id = event.document_id().to_string();
        self.counters.running.fetch_add(1, Ordering::Relaxed);

        let mut attempt = 1;
        loop {
            match (self.handler)(event.clone()).await {
                Ok(()) => {
                    self.counters.completed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        trigger = %self.name,
                        key = %key,
                        document_id = %document_id,
                        attempt,
                        "Trigger completed"
                    );
                    break;
                }
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        trigger = %self.name,
                        key = %key,
                        document_id = %document_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Trigger failed, will retry"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(
                        trigger = %self.name,
                        key = %key,
                        document_id = %document_id,
                        attempt,
                        error = %e,
                        "Trigger failed"
                    );
                    break;
                }
            }
        }

        self.counters.running.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    use postbox_core::{DocumentSnapshot, StoreError};
    use serde_json::Map;

    fn event(kind: DocumentEventKind, id: &str) -> DocumentEvent {
        let snapshot = DocumentSnapshot::new(id, Map::new());
        match kind {
            DocumentEventKind::Created => DocumentEvent::created("posts", snapshot),
            DocumentEventKind::Deleted => DocumentEvent::deleted("posts", snapshot),
        }
    }

    async fn wait_idle(bus: &InMemoryTriggerBus) {
        for _ in 0..200 {
            if bus.is_idle() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("trigger bus never went idle: {:?}", bus.stats());
    }

    #[tokio::test]
    async fn test_event_reaches_matching_trigger() {
        let bus = InMemoryTriggerBus::default();
        let (tx, mut rx) = mpsc::channel(1);

        bus.subscribe(TriggerSubscription::new(
            "probe",
            "posts",
            DocumentEventKind::Created,
            move |event| {
                let tx = tx.clone();
                Box::pin(async move {
                    tx.send(event.document_id().to_string()).await.unwrap();
                    Ok::<(), TriggerError>(())
                })
            },
        ))
        .await
        .unwrap();

        bus.publish(event(DocumentEventKind::Deleted, "ignored"))
            .await
            .unwrap();
        bus.publish(event(DocumentEventKind::Created, "p1"))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(received.as_deref(), Some("p1"));

        wait_idle(&bus).await;
        assert_eq!(
            bus.stats(),
            TriggerStats {
                published: 1,
                running: 0,
                completed: 1,
                failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_publish_without_trigger_is_noop() {
        let bus = InMemoryTriggerBus::default();
        bus.publish(event(DocumentEventKind::Created, "p1"))
            .await
            .unwrap();
        assert_eq!(bus.stats(), TriggerStats::default());
    }

    #[tokio::test]
    async fn test_failed_trigger_is_not_retried_by_default() {
        let bus = InMemoryTriggerBus::default();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        bus.subscribe(TriggerSubscription::new(
            "failing",
            "posts",
            DocumentEventKind::Deleted,
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Err(TriggerError::from(StoreError::Operation("boom".into()))) })
            },
        ))
        .await
        .unwrap();

        bus.publish(event(DocumentEventKind::Deleted, "p1"))
            .await
            .unwrap();
        wait_idle(&bus).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_retry_policy_retries_until_success() {
        let bus = InMemoryTriggerBus::new(TriggerBusConfig {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1),
            ..Default::default()
        });
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        bus.subscribe(TriggerSubscription::new(
            "flaky",
            "posts",
            DocumentEventKind::Created,
            move |_| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Box::pin(async move {
                    if attempt < 3 {
                        Err(TriggerError::from(StoreError::Connection("flaky".into())))
                    } else {
                        Ok(())
                    }
                })
            },
        ))
        .await
        .unwrap();

        bus.publish(event(DocumentEventKind::Created, "p1"))
            .await
            .unwrap();
        wait_idle(&bus).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(bus.stats().completed, 1);
        assert_eq!(bus.stats().failed, 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = InMemoryTriggerBus::default();
        bus.subscribe(TriggerSubscription::new(
            "probe",
            "posts",
            DocumentEventKind::Created,
            |_| Box::pin(async { Ok::<(), TriggerError>(()) }),
        ))
        .await
        .unwrap();

        bus.unsubscribe("posts", DocumentEventKind::Created)
            .await
            .unwrap();
        bus.publish(event(DocumentEventKind::Created, "p1"))
            .await
            .unwrap();

        assert_eq!(bus.stats().published, 0);
    }
}
