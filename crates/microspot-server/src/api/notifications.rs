//! In-app notifications.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use microspot_store::{Notification, StoreError};

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let notifications = db
        .notifications_for_user(user.id)
        .map_err(|e| ApiError::from_store(e, "notifications"))?;

    Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationInput {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateNotificationInput>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    require_user(&headers, &state).await?;

    if input.title.trim().is_empty() || input.content.trim().is_empty() {
        return Err(ApiError::Validation(
            "title and content must not be empty".to_string(),
        ));
    }

    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        kind: input.kind,
        title: input.title,
        content: input.content,
        read: false,
        created_at: Utc::now(),
    };

    {
        let db = state.db.lock().await;
        db.get_user(input.user_id).map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("user"),
            other => ApiError::from_store(other, "user"),
        })?;
        db.create_notification(&notification)
            .map_err(|e| ApiError::from_store(e, "notification"))?;
    }

    state
        .events
        .publish(
            notification.user_id,
            "new-notification",
            serde_json::to_value(&notification).unwrap_or_default(),
        )
        .await;

    Ok((StatusCode::CREATED, Json(notification)))
}

#[derive(Debug, Deserialize)]
pub struct SetReadInput {
    #[serde(default = "default_read")]
    pub read: bool,
}

fn default_read() -> bool {
    true
}

/// Mark one of the caller's notifications read (or unread).  Another
/// user's notification reads as missing.
pub async fn set_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<SetReadInput>,
) -> Result<Json<Notification>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let notification = db
        .set_notification_read(id, user.id, input.read)
        .map_err(|e| ApiError::from_store(e, "notification"))?;

    Ok(Json(notification))
}
