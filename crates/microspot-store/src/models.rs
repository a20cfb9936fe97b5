//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer as a JSON body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Top level of the listing classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MainCategory {
    VendingMachine,
    Kiosk,
    Arcade,
    Logistics,
    Misc,
}

impl MainCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainCategory::VendingMachine => "VENDING_MACHINE",
            MainCategory::Kiosk => "KIOSK",
            MainCategory::Arcade => "ARCADE",
            MainCategory::Logistics => "LOGISTICS",
            MainCategory::Misc => "MISC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "VENDING_MACHINE" => Some(MainCategory::VendingMachine),
            "KIOSK" => Some(MainCategory::Kiosk),
            "ARCADE" => Some(MainCategory::Arcade),
            "LOGISTICS" => Some(MainCategory::Logistics),
            "MISC" => Some(MainCategory::Misc),
            _ => None,
        }
    }
}

/// Second level of the classification.  Which variants are allowed depends
/// on the [`MainCategory`]; see [`crate::categories`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubCategory {
    Food,
    Farm,
    Goods,
    Pet,
    Other,
    Wellness,
}

impl SubCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubCategory::Food => "FOOD",
            SubCategory::Farm => "FARM",
            SubCategory::Goods => "GOODS",
            SubCategory::Pet => "PET",
            SubCategory::Other => "OTHER",
            SubCategory::Wellness => "WELLNESS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FOOD" => Some(SubCategory::Food),
            "FARM" => Some(SubCategory::Farm),
            "GOODS" => Some(SubCategory::Goods),
            "PET" => Some(SubCategory::Pet),
            "OTHER" => Some(SubCategory::Other),
            "WELLNESS" => Some(SubCategory::Wellness),
            _ => None,
        }
    }
}

/// Whether the spot is indoors, outdoors, or a mix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceType {
    Indoor,
    Outdoor,
    Mixed,
}

impl SpaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceType::Indoor => "INDOOR",
            SpaceType::Outdoor => "OUTDOOR",
            SpaceType::Mixed => "MIXED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INDOOR" => Some(SpaceType::Indoor),
            "OUTDOOR" => Some(SpaceType::Outdoor),
            "MIXED" => Some(SpaceType::Mixed),
            _ => None,
        }
    }
}

/// Publication state of a listing.  Search only ever returns `Active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Active,
    Rented,
    Inactive,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Rented => "RENTED",
            ListingStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ListingStatus::Active),
            "RENTED" => Some(ListingStatus::Rented),
            "INACTIVE" => Some(ListingStatus::Inactive),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Access hours
// ---------------------------------------------------------------------------

/// When renters can physically reach the spot.
///
/// The type makes the schema invariant unrepresentable: a 24/7 listing has
/// no opening/closing times, a scheduled one always has both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum AccessHours {
    /// Accessible around the clock.
    #[serde(rename = "24_7")]
    RoundTheClock,
    /// Accessible between two times of day, both `"HH:MM"`.
    Scheduled {
        opening_time: String,
        closing_time: String,
    },
}

impl AccessHours {
    pub fn is_24_7(&self) -> bool {
        matches!(self, AccessHours::RoundTheClock)
    }
}

/// Check that a string is a zero-padded `"HH:MM"` time of day.
///
/// The zero padding matters: the query builder compares opening and
/// closing times lexicographically.
pub fn valid_time_of_day(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    if ![0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit()) {
        return false;
    }
    let hours = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minutes = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hours < 24 && minutes < 60
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.  The bcrypt hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Unique login identifier.
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub email_notifications: bool,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The public fields of a user, as attached to listings and conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

/// Owner fields attached to search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A bearer session issued at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// A rentable micro-space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Square meters, strictly positive.
    pub surface: f64,
    /// Monthly rent in EUR, non-negative.
    pub price: f64,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub main_category: MainCategory,
    pub sub_category: Option<SubCategory>,
    pub specific_type: Option<String>,
    pub space_type: SpaceType,
    pub has_concrete_slab: bool,
    pub has_electricity: bool,
    pub has_water: bool,
    pub internet_type: Option<String>,
    #[serde(flatten)]
    pub access: AccessHours,
    pub status: ListingStatus,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The `(id, title)` pair attached to conversations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingSummary {
    pub id: Uuid,
    pub title: String,
}

/// A listing decorated with its owner's public fields and its images, as
/// returned by search and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingWithDetails {
    #[serde(flatten)]
    pub listing: Listing,
    pub owner: OwnerSummary,
    pub images: Vec<Image>,
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// A photo attached to a listing.  Images are replaced wholesale on listing
/// edit, never diffed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub id: Uuid,
    pub url: String,
    /// Identifier in the upload store.
    pub public_id: String,
    pub listing_id: Uuid,
    pub position: i64,
}

/// An image as submitted by a client: URL plus storage identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageInput {
    pub url: String,
    pub public_id: String,
}

// ---------------------------------------------------------------------------
// Favorite
// ---------------------------------------------------------------------------

/// A user's bookmark of a listing they do not own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Favorite {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A favorite with its listing attached, as returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteWithListing {
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub listing: ListingWithDetails,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A direct message about a listing.  Conversation identity is derived from
/// `(listing_id, sender_id, recipient_id)`, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub listing_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A message with sender/recipient/listing summaries attached, the shape
/// the conversation aggregator consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageWithParties {
    #[serde(flatten)]
    pub message: Message,
    pub sender: UserSummary,
    pub recipient: UserSummary,
    pub listing: ListingSummary,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// An in-app notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
