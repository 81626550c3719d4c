//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Query parameters of the create-post endpoint. None of them is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostQuery {
    pub nick_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Built from raw query pairs. The first occurrence of a key wins and
/// unknown keys are ignored.
impl FromIterator<(String, String)> for CreatePostQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "nickName" => &mut query.nick_name,
                "title" => &mut query.title,
                "body" => &mut query.body,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// Query parameters of the delete-post endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostQuery {
    pub post_id: Option<String>,
}

impl FromIterator<(String, String)> for DeletePostQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        Self {
            post_id: pairs
                .into_iter()
                .find(|(key, _)| key == "postId")
                .map(|(_, value)| value),
        }
    }
}

/// Confirmation returned by the create and delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub result: String,
}

impl ResultResponse {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }
}

/// One element of the list-posts response.
///
/// `createdAt` is intentionally not part of this projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub nick_name: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_summary_wire_shape() {
        let summary = PostSummary {
            id: "p1".to_string(),
            nick_name: Some("alice".to_string()),
            title: None,
            body: Some("hello".to_string()),
        };

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"id": "p1", "nickName": "alice", "title": null, "body": "hello"})
        );
    }

    #[test]
    fn test_delete_query_field_name() {
        let query: DeletePostQuery = serde_json::from_value(json!({"postId": "p1"})).unwrap();
        assert_eq!(query.post_id.as_deref(), Some("p1"));
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_create_query_first_value_wins() {
        let query: CreatePostQuery =
            pairs(&[("title", "a"), ("title", "b"), ("body", "x"), ("extra", "y")])
                .into_iter()
                .collect();

        assert_eq!(query.title.as_deref(), Some("a"));
        assert_eq!(query.body.as_deref(), Some("x"));
        assert_eq!(query.nick_name, None);
    }

    #[test]
    fn test_delete_query_from_pairs() {
        let query: DeletePostQuery = pairs(&[("postId", "p1"), ("postId", "p2")])
            .into_iter()
            .collect();
        assert_eq!(query.post_id.as_deref(), Some("p1"));

        let empty: DeletePostQuery = pairs(&[("other", "p1")]).into_iter().collect();
        assert_eq!(empty.post_id, None);
    }
}
