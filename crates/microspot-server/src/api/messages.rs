//! Direct messages and their conversation views.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use microspot_store::{
    parse_conversation_id, Conversation, Message, MessageWithParties, Notification, StoreError,
};

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SendMessageInput {
    pub content: String,
    pub recipient_id: Uuid,
    pub listing_id: Uuid,
}

pub async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SendMessageInput>,
) -> Result<(StatusCode, Json<MessageWithParties>), ApiError> {
    let user = require_user(&headers, &state).await?;

    let content = input.content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    if input.recipient_id == user.id {
        return Err(ApiError::Validation(
            "cannot send a message to yourself".to_string(),
        ));
    }

    let message = {
        let db = state.db.lock().await;

        db.get_user(input.recipient_id).map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("recipient"),
            other => ApiError::from_store(other, "recipient"),
        })?;
        db.get_listing(input.listing_id)
            .map_err(|e| ApiError::from_store(e, "listing"))?;

        let message = Message {
            id: Uuid::new_v4(),
            content: content.to_string(),
            sender_id: user.id,
            recipient_id: input.recipient_id,
            listing_id: input.listing_id,
            read: false,
            created_at: Utc::now(),
        };
        db.insert_message(&message)
            .map_err(|e| ApiError::from_store(e, "message"))?;

        let full = db
            .get_message(message.id)
            .map_err(|e| ApiError::from_store(e, "message"))?;

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: input.recipient_id,
            kind: "message".to_string(),
            title: "Nouveau message".to_string(),
            content: format!("{} vous a envoyé un message", user.name),
            read: false,
            created_at: Utc::now(),
        };
        // A failed notification never loses the message itself.
        if let Err(e) = db.create_notification(&notification) {
            tracing::warn!(message = %message.id, error = %e, "failed to create message notification");
        } else {
            state
                .events
                .publish(
                    input.recipient_id,
                    "new-notification",
                    serde_json::to_value(&notification).unwrap_or_default(),
                )
                .await;
        }

        full
    };

    state
        .events
        .publish(
            input.recipient_id,
            "new-message",
            serde_json::to_value(&message).unwrap_or_default(),
        )
        .await;

    info!(
        sender = %user.id,
        recipient = %input.recipient_id,
        listing = %input.listing_id,
        "message sent"
    );
    Ok((StatusCode::CREATED, Json(message)))
}

/// The caller's conversations, most recently active first.
pub async fn conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let conversations = db
        .conversations_for_user(user.id)
        .map_err(|e| ApiError::from_store(e, "conversations"))?;

    Ok(Json(conversations))
}

/// One thread, oldest first.  Fetching it marks the caller's unread
/// messages in the thread as read.
pub async fn thread(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<MessageWithParties>>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let (listing_id, other_user_id) = parse_conversation_id(&conversation_id).ok_or_else(|| {
        ApiError::Validation(format!("malformed conversation id: {conversation_id}"))
    })?;

    let db = state.db.lock().await;
    let messages = db
        .fetch_thread_and_mark_read(listing_id, other_user_id, user.id)
        .map_err(|e| ApiError::from_store(e, "conversation"))?;

    Ok(Json(messages))
}
