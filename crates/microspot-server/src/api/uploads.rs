//! Image upload endpoint.

use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::info;

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;
use crate::upload_store::StoredFile;

/// Accept one multipart `file` field and store it, returning its public
/// URL and identifier.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>), ApiError> {
    let user = require_user(&headers, &state).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {e}")))?;

        let stored = state.uploads.store_file(&original_name, &data).await?;

        info!(user = %user.id, public_id = %stored.public_id, size = data.len(), "file uploaded");
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(ApiError::Validation(
        "multipart body must contain a 'file' field".to_string(),
    ))
}
