//! Registration, login and logout.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use microspot_store::{StoreError, User};

use crate::api::AppState;
use crate::auth::{bearer_token, hash_password, verify_password};
use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = input.name.trim();
    let email = input.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("invalid email address".to_string()));
    }
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email,
        password_hash: hash_password(&input.password)?,
        display_name: None,
        bio: None,
        phone_number: None,
        email_notifications: true,
        profile_image: None,
        cover_image: None,
        created_at: Utc::now(),
    };

    let db = state.db.lock().await;
    db.create_user(&user)
        .map_err(|e| ApiError::from_store(e, "user"))?;

    info!(user = %user.id, "registered new account");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = input.email.trim().to_lowercase();

    let db = state.db.lock().await;
    let user = match db.get_user_by_email(&email) {
        Ok(user) => user,
        // A missing account and a bad password read the same to the client.
        Err(StoreError::NotFound) => return Err(ApiError::Unauthorized),
        Err(e) => return Err(ApiError::from_store(e, "user")),
    };

    if !verify_password(&input.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let session = db
        .create_session(user.id)
        .map_err(|e| ApiError::from_store(e, "session"))?;

    info!(user = %user.id, "login");
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

    let db = state.db.lock().await;
    if !db
        .delete_session(token)
        .map_err(|e| ApiError::from_store(e, "session"))?
    {
        return Err(ApiError::Unauthorized);
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}
