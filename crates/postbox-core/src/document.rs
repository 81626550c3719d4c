//! Schemaless document model shared by every store backend.
//!
//! Documents are JSON objects addressed by collection name + document id.
//! Writes are expressed as [`Fields`], which may carry the
//! [`FieldValue::ServerTimestamp`] sentinel; the store swaps it for its own
//! clock when the write commits.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A value written into a single document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Literal JSON value, stored as-is.
    Value(Value),
    /// Replaced by the store's clock at commit time.
    ServerTimestamp,
}

impl FieldValue {
    /// Resolve the value against the store's commit time.
    pub fn resolve(self, now: DateTime<Utc>) -> Value {
        match self {
            FieldValue::Value(value) => value,
            FieldValue::ServerTimestamp => Value::String(format_timestamp(now)),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(Value::String(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(Value::String(value.to_string()))
    }
}

/// Timestamps are stored as RFC 3339 strings in UTC.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Field name -> value pairs of a single write.
///
/// A field that is not present is not written at all, which is how absent
/// optional values are carried through to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert the value only when it is present.
    pub fn with_optional<V: Into<FieldValue>>(
        mut self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        if let Some(value) = value {
            self.insert(name, value);
        }
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the write needs the store's clock.
    pub fn has_server_timestamp(&self) -> bool {
        self.0
            .values()
            .any(|value| matches!(value, FieldValue::ServerTimestamp))
    }

    /// Turn the write into a stored JSON object, stamping server timestamps
    /// with `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> Map<String, Value> {
        self.0
            .into_iter()
            .map(|(name, value)| (name, value.resolve(now)))
            .collect()
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A committed document as read from a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Map<String, Value>,
}

impl DocumentSnapshot {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Raw value of a field, `None` when the field is absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Decode the document into a typed value.
    ///
    /// The document id is exposed to the target type under `id`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut object = self.data.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(object))
            .map_err(|e| StoreError::Serialization(format!("document {}: {}", self.id, e)))
    }
}

/// Kind of change a trigger can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentEventKind {
    Created,
    Deleted,
}

impl fmt::Display for DocumentEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentEventKind::Created => write!(f, "created"),
            DocumentEventKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// Immutable payload delivered to triggers after a write commits.
///
/// For `Created` the snapshot is the freshly committed document, for
/// `Deleted` it is the last state before removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub kind: DocumentEventKind,
    pub collection: String,
    pub snapshot: DocumentSnapshot,
}

impl DocumentEvent {
    pub fn created(collection: impl Into<String>, snapshot: DocumentSnapshot) -> Self {
        Self {
            kind: DocumentEventKind::Created,
            collection: collection.into(),
            snapshot,
        }
    }

    pub fn deleted(collection: impl Into<String>, snapshot: DocumentSnapshot) -> Self {
        Self {
            kind: DocumentEventKind::Deleted,
            collection: collection.into(),
            snapshot,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.snapshot.id
    }

    /// Routing key of the event, see [`trigger_key`].
    pub fn key(&self) -> String {
        trigger_key(&self.collection, self.kind)
    }
}

/// Triggers are keyed by `(collection, event kind)`, rendered `posts:created`.
pub fn trigger_key(collection: &str, kind: DocumentEventKind) -> String {
    format!("{}:{}", collection, kind)
}
