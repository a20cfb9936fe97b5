//! Listing search, creation and editing.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use microspot_store::{
    categories, valid_time_of_day, AccessFilter, AccessHours, ImageInput, Listing, ListingFilter,
    ListingStatus, ListingUpdate, ListingWithDetails, MainCategory, SpaceType, SubCategory,
};

use crate::api::AppState;
use crate::auth::require_user;
use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Raw query-string parameters.  Everything arrives as a string and gets
/// validated into a [`ListingFilter`]; unknown values are a client error,
/// never silently ignored.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub location: Option<String>,
    pub main_category: Option<String>,
    pub sub_category: Option<String>,
    pub specific_type: Option<String>,
    pub space_type: Option<String>,
    pub min_surface: Option<String>,
    pub max_surface: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub has_concrete_slab: Option<String>,
    pub has_electricity: Option<String>,
    pub has_water: Option<String>,
    pub has_internet: Option<String>,
    pub access: Option<String>,
    pub open_before: Option<String>,
    pub open_after: Option<String>,
}

impl SearchParams {
    pub fn into_filter(self) -> Result<ListingFilter, ApiError> {
        let main_category = self
            .main_category
            .as_deref()
            .map(|s| {
                MainCategory::parse(s)
                    .ok_or_else(|| ApiError::Validation(format!("unknown main_category: {s}")))
            })
            .transpose()?;
        let sub_category = self
            .sub_category
            .as_deref()
            .map(|s| {
                SubCategory::parse(s)
                    .ok_or_else(|| ApiError::Validation(format!("unknown sub_category: {s}")))
            })
            .transpose()?;
        let space_type = self
            .space_type
            .as_deref()
            .map(|s| {
                SpaceType::parse(s)
                    .ok_or_else(|| ApiError::Validation(format!("unknown space_type: {s}")))
            })
            .transpose()?;

        // A sub-category only means something under its main category.
        match (main_category, sub_category) {
            (None, Some(_)) => {
                return Err(ApiError::Validation(
                    "sub_category requires main_category".to_string(),
                ));
            }
            (Some(main), sub) => {
                categories::validate_selection(main, sub, self.specific_type.as_deref())
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
            }
            (None, None) => {}
        }

        let access = match self.access.as_deref() {
            None => None,
            Some("24_7") => Some(AccessFilter::RoundTheClock),
            Some("scheduled") => Some(AccessFilter::Scheduled),
            Some(other) => {
                return Err(ApiError::Validation(format!("unknown access: {other}")));
            }
        };

        for (name, value) in [
            ("open_before", &self.open_before),
            ("open_after", &self.open_after),
        ] {
            if let Some(v) = value {
                if !valid_time_of_day(v) {
                    return Err(ApiError::Validation(format!(
                        "{name} must be a zero-padded HH:MM time, got {v}"
                    )));
                }
            }
        }

        Ok(ListingFilter {
            query: self.query,
            location: self.location,
            main_category,
            sub_category,
            specific_type: self.specific_type,
            space_type,
            min_surface: parse_number("min_surface", self.min_surface)?,
            max_surface: parse_number("max_surface", self.max_surface)?,
            min_price: parse_number("min_price", self.min_price)?,
            max_price: parse_number("max_price", self.max_price)?,
            has_concrete_slab: flag(&self.has_concrete_slab),
            has_electricity: flag(&self.has_electricity),
            has_water: flag(&self.has_water),
            has_internet: flag(&self.has_internet),
            access,
            open_before: self.open_before,
            open_after: self.open_after,
        })
    }
}

fn parse_number(name: &str, value: Option<String>) -> Result<Option<f64>, ApiError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let n: f64 = raw
                .parse()
                .map_err(|_| ApiError::Validation(format!("{name} must be a number, got {raw}")))?;
            if !n.is_finite() || n < 0.0 {
                return Err(ApiError::Validation(format!(
                    "{name} must be non-negative, got {raw}"
                )));
            }
            Ok(Some(n))
        }
    }
}

/// Amenity flags filter only on the literal string `"true"`.
fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ListingWithDetails>>, ApiError> {
    let filter = params.into_filter()?;

    let db = state.db.lock().await;
    let listings = db
        .search_listings(&filter)
        .map_err(|e| ApiError::from_store(e, "listings"))?;

    Ok(Json(listings))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateListingInput {
    pub title: String,
    pub description: String,
    pub surface: f64,
    pub price: f64,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub main_category: MainCategory,
    pub sub_category: Option<SubCategory>,
    pub specific_type: Option<String>,
    pub space_type: SpaceType,
    #[serde(default)]
    pub has_concrete_slab: bool,
    #[serde(default)]
    pub has_electricity: bool,
    #[serde(default)]
    pub has_water: bool,
    pub internet_type: Option<String>,
    #[serde(flatten)]
    pub access: AccessHours,
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateListingInput>,
) -> Result<(StatusCode, Json<ListingWithDetails>), ApiError> {
    let user = require_user(&headers, &state).await?;

    validate_text_fields(
        &input.title,
        &input.description,
        &input.address,
        &input.postal_code,
        &input.city,
    )?;
    validate_numbers(input.surface, input.price)?;
    validate_access(&input.access)?;
    categories::validate_selection(
        input.main_category,
        input.sub_category,
        input.specific_type.as_deref(),
    )
    .map_err(|e| ApiError::Validation(e.to_string()))?;

    let now = Utc::now();
    let listing = Listing {
        id: Uuid::new_v4(),
        title: input.title.trim().to_string(),
        description: input.description,
        surface: input.surface,
        price: input.price,
        address: input.address,
        postal_code: input.postal_code,
        city: input.city,
        main_category: input.main_category,
        sub_category: input.sub_category,
        specific_type: input.specific_type,
        space_type: input.space_type,
        has_concrete_slab: input.has_concrete_slab,
        has_electricity: input.has_electricity,
        has_water: input.has_water,
        internet_type: input.internet_type,
        access: input.access,
        status: ListingStatus::Active,
        owner_id: user.id,
        created_at: now,
        updated_at: now,
    };

    let mut db = state.db.lock().await;
    db.create_listing(&listing, &input.images)
        .map_err(|e| ApiError::from_store(e, "listing"))?;
    let created = db
        .get_listing(listing.id)
        .map_err(|e| ApiError::from_store(e, "listing"))?;

    info!(listing = %listing.id, owner = %user.id, "created listing");
    Ok((StatusCode::CREATED, Json(created)))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListingWithDetails>, ApiError> {
    let db = state.db.lock().await;
    let listing = db
        .get_listing(id)
        .map_err(|e| ApiError::from_store(e, "listing"))?;

    Ok(Json(listing))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// The category triple is fixed at creation and absent here.
#[derive(Debug, Deserialize)]
pub struct UpdateListingInput {
    pub title: String,
    pub description: String,
    pub surface: f64,
    pub price: f64,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub space_type: SpaceType,
    #[serde(default)]
    pub has_concrete_slab: bool,
    #[serde(default)]
    pub has_electricity: bool,
    #[serde(default)]
    pub has_water: bool,
    pub internet_type: Option<String>,
    #[serde(flatten)]
    pub access: AccessHours,
    #[serde(default)]
    pub images: Vec<ImageInput>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateListingInput>,
) -> Result<Json<ListingWithDetails>, ApiError> {
    let user = require_user(&headers, &state).await?;

    validate_text_fields(
        &input.title,
        &input.description,
        &input.address,
        &input.postal_code,
        &input.city,
    )?;
    validate_numbers(input.surface, input.price)?;
    validate_access(&input.access)?;

    let mut db = state.db.lock().await;
    let existing = db
        .get_listing(id)
        .map_err(|e| ApiError::from_store(e, "listing"))?;
    if existing.listing.owner_id != user.id {
        return Err(ApiError::Forbidden(
            "only the owner can edit a listing".to_string(),
        ));
    }

    let update = ListingUpdate {
        title: input.title.trim().to_string(),
        description: input.description,
        surface: input.surface,
        price: input.price,
        address: input.address,
        postal_code: input.postal_code,
        city: input.city,
        space_type: input.space_type,
        has_concrete_slab: input.has_concrete_slab,
        has_electricity: input.has_electricity,
        has_water: input.has_water,
        internet_type: input.internet_type,
        access: input.access,
    };
    db.update_listing(id, &update, &input.images)
        .map_err(|e| ApiError::from_store(e, "listing"))?;

    let updated = db
        .get_listing(id)
        .map_err(|e| ApiError::from_store(e, "listing"))?;

    info!(listing = %id, owner = %user.id, "updated listing");
    Ok(Json(updated))
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_text_fields(
    title: &str,
    description: &str,
    address: &str,
    postal_code: &str,
    city: &str,
) -> Result<(), ApiError> {
    for (name, value) in [
        ("title", title),
        ("description", description),
        ("address", address),
        ("postal_code", postal_code),
        ("city", city),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{name} must not be empty")));
        }
    }
    Ok(())
}

fn validate_numbers(surface: f64, price: f64) -> Result<(), ApiError> {
    if !surface.is_finite() || surface <= 0.0 {
        return Err(ApiError::Validation(
            "surface must be strictly positive".to_string(),
        ));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::Validation(
            "price must be non-negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_access(access: &AccessHours) -> Result<(), ApiError> {
    if let AccessHours::Scheduled {
        opening_time,
        closing_time,
    } = access
    {
        if !valid_time_of_day(opening_time) || !valid_time_of_day(closing_time) {
            return Err(ApiError::Validation(
                "opening_time and closing_time must be zero-padded HH:MM times".to_string(),
            ));
        }
        // Zero-padded HH:MM compares correctly as a string.
        if opening_time >= closing_time {
            return Err(ApiError::Validation(
                "opening_time must be before closing_time".to_string(),
            ));
        }
    }
    Ok(())
}
