//! In-memory document store - the default backend when Redis is not configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use postbox_core::ports::DocumentStore;
use postbox_core::{DocumentSnapshot, Fields, StoreError};

type Collection = HashMap<String, Map<String, Value>>;

/// In-memory document store using nested HashMaps behind an async RwLock.
///
/// Server timestamps are taken from the process clock while the write lock
/// is held. Note: Data is lost on process restart.
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn generate_id(collection: &Collection) -> String {
        loop {
            let id = Uuid::new_v4().simple().to_string();
            if !collection.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| DocumentSnapshot::new(id, data.clone())))
    }

    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| DocumentSnapshot::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentSnapshot, StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        let id = Self::generate_id(docs);
        let data = fields.resolve(Utc::now());
        docs.insert(id.clone(), data.clone());

        tracing::debug!(collection = %collection, document_id = %id, "Document added");
        Ok(DocumentSnapshot::new(id, data))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let data = fields.resolve(Utc::now());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let data = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        data.extend(fields.resolve(Utc::now()));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        let mut collections = self.collections.write().await;
        let removed = collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|data| DocumentSnapshot::new(id, data));

        if removed.is_some() {
            tracing::debug!(collection = %collection, document_id = %id, "Document deleted");
        }
        Ok(removed)
    }
}
