//! The authenticated user's own profile and listings.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use microspot_store::{AccountImage, ListingWithDetails, ProfileUpdate, User};

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;

pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let user = require_user(&headers, &state).await?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let updated = db
        .update_profile(user.id, &update)
        .map_err(|e| ApiError::from_store(e, "user"))?;

    Ok(Json(updated))
}

/// Every listing the caller owns, inactive ones included.
pub async fn own_listings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ListingWithDetails>>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let db = state.db.lock().await;
    let listings = db
        .listings_for_owner(user.id)
        .map_err(|e| ApiError::from_store(e, "listings"))?;

    Ok(Json(listings))
}

#[derive(Debug, Deserialize)]
pub struct SetImageInput {
    pub url: String,
}

pub async fn set_image(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(input): Json<SetImageInput>,
) -> Result<Json<User>, ApiError> {
    let user = require_user(&headers, &state).await?;

    let which = match kind.as_str() {
        "profile" => AccountImage::Profile,
        "cover" => AccountImage::Cover,
        other => {
            return Err(ApiError::Validation(format!(
                "unknown image kind: {other} (expected profile or cover)"
            )));
        }
    };
    if input.url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }

    let db = state.db.lock().await;
    let updated = db
        .set_account_image(user.id, which, &input.url)
        .map_err(|e| ApiError::from_store(e, "user"))?;

    info!(user = %user.id, kind = %kind, "replaced account image");
    Ok(Json(updated))
}
