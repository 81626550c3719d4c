use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentSnapshot, FieldValue, Fields};
use crate::error::StoreError;

use super::post::fields;

/// A deleted post preserved in the archive collection under its original id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedPost {
    pub id: String,
    pub nick_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ArchivedPost {
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self, StoreError> {
        snapshot.decode()
    }

    /// Archive record for the last snapshot of a deleted post.
    ///
    /// Content fields and `createdAt` are copied verbatim, absent ones stay
    /// absent. `deletedAt` is stamped by the store.
    pub fn fields_from_deleted(snapshot: &DocumentSnapshot) -> Fields {
        let mut archived = Fields::new();
        for name in [
            fields::NICK_NAME,
            fields::TITLE,
            fields::BODY,
            fields::CREATED_AT,
        ] {
            if let Some(value) = snapshot.field(name) {
                archived.insert(name, value.clone());
            }
        }
        archived.with(fields::DELETED_AT, FieldValue::ServerTimestamp)
    }
}
