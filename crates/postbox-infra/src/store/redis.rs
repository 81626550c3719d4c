//! Redis document store.
//!
//! Each collection is one Redis hash (`{prefix}:{collection}`) mapping
//! document ids to JSON documents. Server timestamps come from Redis `TIME`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use serde_json::{Map, Value};
use uuid::Uuid;

use postbox_core::ports::DocumentStore;
use postbox_core::{DocumentSnapshot, Fields, StoreError};

/// Merge a JSON patch into an existing document. Returns 0 when missing.
const UPDATE_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], ARGV[1])
if not current then
    return 0
end
local doc = cjson.decode(current)
local patch = cjson.decode(ARGV[2])
for name, value in pairs(patch) do
    doc[name] = value
end
redis.call('HSET', KEYS[1], ARGV[1], cjson.encode(doc))
return 1
"#;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix of the per-collection hash keys
    pub key_prefix: String,
    /// Whether to fallback to the in-memory store if Redis is unavailable
    pub fallback_to_memory: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "postbox".to_string(),
            fallback_to_memory: true,
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "postbox".to_string()),
            fallback_to_memory: std::env::var("REDIS_FALLBACK_TO_MEMORY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }
}

/// Redis-backed document store.
///
/// Uses connection manager for automatic reconnection.
pub struct RedisDocumentStore {
    conn: ConnectionManager,
    config: RedisConfig,
    update_script: Script,
}

impl RedisDocumentStore {
    pub async fn new(config: RedisConfig) -> Result<Self, StoreError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| StoreError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Connection("Connection timed out".to_string()))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "Connected to Redis document store");

        Ok(Self {
            conn,
            config,
            update_script: Script::new(UPDATE_SCRIPT),
        })
    }

    fn collection_key(&self, collection: &str) -> String {
        format!("{}:{}", self.config.key_prefix, collection)
    }

    /// Commit time for writes that carry server timestamps.
    async fn server_time(&self, fields: &Fields) -> Result<DateTime<Utc>, StoreError> {
        if !fields.has_server_timestamp() {
            return Ok(Utc::now());
        }

        let mut conn = self.conn.clone();
        let (secs, micros): (i64, u32) = redis::cmd("TIME")
            .query_async(&mut conn)
            .await
            .map_err(operation_error)?;

        DateTime::from_timestamp(secs, micros * 1_000)
            .ok_or_else(|| StoreError::Operation(format!("invalid server time {}.{}", secs, micros)))
    }

    async fn encode(&self, fields: Fields) -> Result<(Map<String, Value>, String), StoreError> {
        let now = self.server_time(&fields).await?;
        let data = fields.resolve(now);
        let raw = serde_json::to_string(&data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok((data, raw))
    }
}

fn operation_error(e: redis::RedisError) -> StoreError {
    if e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Operation(e.to_string())
    }
}

fn decode_document(id: &str, raw: &str) -> Result<DocumentSnapshot, StoreError> {
    let data: Map<String, Value> = serde_json::from_str(raw)
        .map_err(|e| StoreError::Serialization(format!("document {}: {}", id, e)))?;
    Ok(DocumentSnapshot::new(id, data))
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .hget(self.collection_key(collection), id)
            .await
            .map_err(operation_error)?;

        raw.map(|raw| decode_document(id, &raw)).transpose()
    }

    async fn list(&self, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError> {
        let mut conn = self.conn.clone();
        let docs: HashMap<String, String> = conn
            .hgetall(self.collection_key(collection))
            .await
            .map_err(operation_error)?;

        docs.iter()
            .map(|(id, raw)| decode_document(id, raw))
            .collect()
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentSnapshot, StoreError> {
        let key = self.collection_key(collection);
        let (data, raw) = self.encode(fields).await?;
        let mut conn = self.conn.clone();

        loop {
            let id = Uuid::new_v4().simple().to_string();
            let created: bool = conn
                .hset_nx(&key, &id, &raw)
                .await
                .map_err(operation_error)?;

            if created {
                tracing::debug!(collection = %collection, document_id = %id, "Document added");
                return Ok(DocumentSnapshot::new(id, data));
            }
        }
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let (_, raw) = self.encode(fields).await?;
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(self.collection_key(collection), id, raw)
            .await
            .map_err(operation_error)?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let (_, patch) = self.encode(fields).await?;
        let mut conn = self.conn.clone();

        let mut invocation = self.update_script.key(self.collection_key(collection));
        invocation.arg(id).arg(patch);
        let updated: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(operation_error)?;

        if updated == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<DocumentSnapshot>, StoreError> {
        let key = self.collection_key(collection);
        let mut conn = self.conn.clone();

        let (raw, _removed): (Option<String>, i64) = redis::pipe()
            .atomic()
            .hget(&key, id)
            .hdel(&key, id)
            .query_async(&mut conn)
            .await
            .map_err(operation_error)?;

        raw.map(|raw| decode_document(id, &raw)).transpose()
    }
}
