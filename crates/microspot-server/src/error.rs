use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use microspot_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Internal(_) => {
                // Detail is logged at the boundary, never leaked.
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

impl ApiError {
    /// Convert a store error, naming the resource for 404 messages.
    pub fn from_store(err: StoreError, resource: &'static str) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(resource),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Rejected(msg) => ApiError::Validation(msg),
            other => {
                tracing::error!(error = %other, resource, "store operation failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::from_store(err, "resource")
    }
}
