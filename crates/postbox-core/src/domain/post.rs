use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{DocumentSnapshot, Fields};
use crate::error::StoreError;

/// Stored field names.
pub mod fields {
    pub const NICK_NAME: &str = "nickName";
    pub const TITLE: &str = "title";
    pub const BODY: &str = "body";
    pub const CREATED_AT: &str = "createdAt";
    pub const DELETED_AT: &str = "deletedAt";
}

/// Content of a post about to be created. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub nick_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NewPost {
    pub fn new(nick_name: Option<String>, title: Option<String>, body: Option<String>) -> Self {
        Self {
            nick_name,
            title,
            body,
        }
    }

    /// Exactly the three content fields; absent values are not written.
    pub fn into_fields(self) -> Fields {
        Fields::new()
            .with_optional(fields::NICK_NAME, self.nick_name)
            .with_optional(fields::TITLE, self.title)
            .with_optional(fields::BODY, self.body)
    }
}

/// Post entity - a document of the primary collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub nick_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    /// Set once by the create-enrichment trigger.
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self, StoreError> {
        snapshot.decode()
    }
}
