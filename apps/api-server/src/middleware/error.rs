//! Error handling - maps handler failures to plain-text responses.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use postbox_core::StoreError;
use std::fmt;

/// Application-level error type returned by handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing or unusable request parameter. Reported before any store access.
    BadRequest(String),
    /// The referenced document does not exist.
    NotFound(String),
    /// Store failure. Only `message` reaches the caller; `source` is logged.
    Internal {
        message: &'static str,
        source: StoreError,
    },
}

impl AppError {
    pub fn internal(message: &'static str, source: StoreError) -> Self {
        AppError::Internal { message, source }
    }

    /// Text sent to the caller.
    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
            AppError::Internal { message, .. } => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal { message, source } => write!(f, "{}: {}", message, source),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal { message, source } = self {
            tracing::error!(error = %source, "{}", message);
        }

        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.message().to_string())
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_internal_error_hides_source() {
        let err = AppError::internal(
            "Error listing the posts",
            StoreError::Connection("redis://secret-host refused".into()),
        );

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        assert_eq!(body, "Error listing the posts");
    }

    #[actix_web::test]
    async fn test_client_errors_are_plain_text() {
        let response = AppError::BadRequest("post id required".into()).error_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }
}
