//! Bookmarked listings.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use microspot_store::{Favorite, FavoriteWithListing};

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<FavoriteWithListing>>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let favorites = db
        .favorites_for_user(user.id)
        .map_err(|e| ApiError::from_store(e, "favorites"))?;

    Ok(Json(favorites))
}

pub async fn add(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Favorite>), ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let favorite = db
        .add_favorite(user.id, listing_id)
        .map_err(|e| ApiError::from_store(e, "listing"))?;

    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    db.remove_favorite(user.id, listing_id)
        .map_err(|e| ApiError::from_store(e, "favorite"))?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
