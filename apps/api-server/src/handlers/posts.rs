//! Post functions: create, delete and list.
//!
//! Each handler issues the store calls for one operation and nothing else;
//! `createdAt` stamping and archiving happen in the document triggers.

use actix_web::{HttpResponse, web};

use postbox_core::domain::NewPost;
use postbox_shared::dto::{CreatePostQuery, DeletePostQuery, PostSummary, ResultResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const INSERT_FAILED: &str = "Error inserting the post";
const DELETE_FAILED: &str = "Error deleting the post";
const LIST_FAILED: &str = "Error listing the posts";

/// Query pairs as sent. Repeated keys are kept and resolved by the DTOs.
type QueryPairs = web::Query<Vec<(String, String)>>;

/// /addPost?nickName=..&title=..&body=..
pub async fn add_post(state: web::Data<AppState>, query: QueryPairs) -> AppResult<HttpResponse> {
    let CreatePostQuery {
        nick_name,
        title,
        body,
    } = query.into_inner().into_iter().collect::<CreatePostQuery>();
    let post = NewPost::new(nick_name, title, body);

    let created = state
        .store
        .add(&state.collections.posts, post.into_fields())
        .await
        .map_err(|e| AppError::internal(INSERT_FAILED, e))?;

    tracing::info!(document_id = %created.id, "Post inserted");

    Ok(HttpResponse::Ok().json(ResultResponse::new(format!(
        "Post with ID: {} was inserted successfully.",
        created.id
    ))))
}

/// /deletePost?postId=..
pub async fn delete_post(state: web::Data<AppState>, query: QueryPairs) -> AppResult<HttpResponse> {
    let post_id = query
        .into_inner()
        .into_iter()
        .collect::<DeletePostQuery>()
        .post_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("post id required".to_string()))?;

    let posts = &state.collections.posts;
    let existing = state
        .store
        .get(posts, &post_id)
        .await
        .map_err(|e| AppError::internal(DELETE_FAILED, e))?;

    if existing.is_none() {
        return Err(AppError::NotFound(format!(
            "Post with ID: {} not found",
            post_id
        )));
    }

    state
        .store
        .delete(posts, &post_id)
        .await
        .map_err(|e| AppError::internal(DELETE_FAILED, e))?;

    tracing::info!(document_id = %post_id, "Post deleted");

    Ok(HttpResponse::Ok().json(ResultResponse::new(format!(
        "Post with ID: {} was deleted successfully.",
        post_id
    ))))
}

/// /getPosts
pub async fn get_posts(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let snapshots = state
        .store
        .list(&state.collections.posts)
        .await
        .map_err(|e| AppError::internal(LIST_FAILED, e))?;

    // Decoded straight into the projection so `createdAt` is never read
    let posts = snapshots
        .iter()
        .map(|snapshot| snapshot.decode::<PostSummary>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::internal(LIST_FAILED, e))?;

    Ok(HttpResponse::Ok().json(posts))
}
