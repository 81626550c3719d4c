//! Trigger handlers for the post collection.
//!
//! Each handler performs exactly one follow-up write and never retries;
//! failures go back to the trigger runtime.

use std::sync::Arc;

use crate::document::{DocumentEvent, DocumentEventKind, FieldValue, Fields};
use crate::domain::{ArchivedPost, fields};
use crate::error::TriggerError;
use crate::ports::{DocumentStore, TriggerSubscription};

pub const CREATE_ENRICHMENT: &str = "create-enrichment";
pub const ARCHIVE_ON_DELETE: &str = "archive-on-delete";

/// Stamp `createdAt` on a freshly created post with a partial update.
pub async fn stamp_created_at(
    store: &dyn DocumentStore,
    event: &DocumentEvent,
) -> Result<(), TriggerError> {
    expect_kind(event, DocumentEventKind::Created)?;

    let stamp = Fields::new().with(fields::CREATED_AT, FieldValue::ServerTimestamp);
    store
        .update(&event.collection, event.document_id(), stamp)
        .await?;
    Ok(())
}

/// Write the archive record of a deleted post at the same id, as a full
/// replace.
pub async fn archive_deleted_post(
    store: &dyn DocumentStore,
    archive_collection: &str,
    event: &DocumentEvent,
) -> Result<(), TriggerError> {
    expect_kind(event, DocumentEventKind::Deleted)?;

    let archived = ArchivedPost::fields_from_deleted(&event.snapshot);
    store
        .set(archive_collection, event.document_id(), archived)
        .await?;
    Ok(())
}

fn expect_kind(event: &DocumentEvent, kind: DocumentEventKind) -> Result<(), TriggerError> {
    if event.kind != kind {
        return Err(TriggerError::UnexpectedEvent(event.key()));
    }
    Ok(())
}

/// Both post triggers, ready to be registered on a trigger bus.
pub fn post_triggers(
    store: Arc<dyn DocumentStore>,
    posts_collection: &str,
    archive_collection: &str,
) -> Vec<TriggerSubscription> {
    let enrich_store = store.clone();
    let enrich = TriggerSubscription::new(
        CREATE_ENRICHMENT,
        posts_collection,
        DocumentEventKind::Created,
        move |event| {
            let store = enrich_store.clone();
            Box::pin(async move { stamp_created_at(store.as_ref(), &event).await })
        },
    );

    let archive_collection = archive_collection.to_string();
    let archive = TriggerSubscription::new(
        ARCHIVE_ON_DELETE,
        posts_collection,
        DocumentEventKind::Deleted,
        move |event| {
            let store = store.clone();
            let archive_collection = archive_collection.clone();
            Box::pin(async move {
                archive_deleted_post(store.as_ref(), &archive_collection, &event).await
            })
        },
    );

    vec![enrich, archive]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::document::DocumentSnapshot;
    use crate::error::StoreError;

    #[derive(Debug, PartialEq)]
    enum Call {
        Set(String, String, Fields),
        Update(String, String, Fields),
    }

    /// Records writes instead of storing anything.
    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn get(&self, _: &str, _: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
            Ok(None)
        }

        async fn list(&self, _: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
            Ok(Vec::new())
        }

        async fn add(&self, _: &str, _: Fields) -> Result<DocumentSnapshot, StoreError> {
            Err(StoreError::Operation("not recorded".into()))
        }

        async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Set(collection.into(), id.into(), fields));
            Ok(())
        }

        async fn update(
            &self,
            collection: &str,
            id: &str,
            fields: Fields,
        ) -> Result<(), StoreError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(collection.into(), id.into(), fields));
            Ok(())
        }

        async fn delete(&self, _: &str, _: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
            Ok(None)
        }
    }

    fn snapshot(id: &str, data: serde_json::Value) -> DocumentSnapshot {
        DocumentSnapshot::new(id, data.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_stamp_created_at_only_touches_created_at() {
        let store = RecordingStore::default();
        let event = DocumentEvent::created("posts", snapshot("p1", json!({"title": "hi"})));

        stamp_created_at(&store, &event).await.unwrap();

        let calls = store.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![Call::Update(
                "posts".into(),
                "p1".into(),
                Fields::new().with("createdAt", FieldValue::ServerTimestamp)
            )]
        );
    }

    #[tokio::test]
    async fn test_archive_writes_same_id_into_archive_collection() {
        let store = RecordingStore::default();
        let event = DocumentEvent::deleted(
            "posts",
            snapshot("p1", json!({"nickName": "alice", "body": "hello"})),
        );

        archive_deleted_post(&store, "archive", &event).await.unwrap();

        let calls = store.calls.lock().unwrap();
        match calls.as_slice() {
            [Call::Set(collection, id, fields)] => {
                assert_eq!(collection, "archive");
                assert_eq!(id, "p1");
                assert_eq!(fields.get("nickName"), Some(&FieldValue::Value(json!("alice"))));
                assert!(!fields.contains("title"));
                assert_eq!(fields.get("deletedAt"), Some(&FieldValue::ServerTimestamp));
            }
            other => panic!("unexpected calls: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handlers_reject_wrong_event_kind() {
        let store = RecordingStore::default();
        let created = DocumentEvent::created("posts", snapshot("p1", json!({})));

        let result = archive_deleted_post(&store, "archive", &created).await;

        assert!(matches!(result, Err(TriggerError::UnexpectedEvent(_))));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_post_triggers_keys() {
        let store: Arc<dyn DocumentStore> = Arc::new(RecordingStore::default());
        let triggers = post_triggers(store, "posts", "archive");

        let keys: Vec<_> = triggers
            .iter()
            .map(|t| (t.name.as_str(), t.collection.as_str(), t.kind))
            .collect();
        assert_eq!(
            keys,
            vec![
                (CREATE_ENRICHMENT, "posts", DocumentEventKind::Created),
                (ARCHIVE_ON_DELETE, "posts", DocumentEventKind::Deleted),
            ]
        );
    }
}
