//! Shared fixtures for the crate's unit tests.

use chrono::Utc;
use uuid::Uuid;

use crate::database::Database;
use crate::models::{
    AccessHours, Listing, ListingStatus, MainCategory, SpaceType, SubCategory, User,
};

/// A fresh in-memory database with the full schema applied.
pub(crate) fn test_db() -> Database {
    Database::open_in_memory().expect("in-memory database should open")
}

/// A user record that has not been inserted yet.
pub(crate) fn user_record(name: &str, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "$2b$10$test-hash".to_string(),
        display_name: None,
        bio: None,
        phone_number: None,
        email_notifications: true,
        profile_image: None,
        cover_image: None,
        created_at: Utc::now(),
    }
}

/// Insert and return a user.
pub(crate) fn new_user(db: &Database, name: &str, email: &str) -> User {
    let user = user_record(name, email);
    db.create_user(&user).expect("user insert should succeed");
    user
}

/// Insert and return an unread message sent `minutes` after a fixed base
/// time, so tests control chronological order.
pub(crate) fn new_message(
    db: &Database,
    sender_id: Uuid,
    recipient_id: Uuid,
    listing_id: Uuid,
    content: &str,
    minutes: i64,
) -> crate::models::Message {
    let base = chrono::DateTime::parse_from_rfc3339("2026-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let message = crate::models::Message {
        id: Uuid::new_v4(),
        content: content.to_string(),
        sender_id,
        recipient_id,
        listing_id,
        read: false,
        created_at: base + chrono::Duration::minutes(minutes),
    };
    db.insert_message(&message)
        .expect("message insert should succeed");
    message
}

/// A plausible active listing owned by `owner_id`, not yet inserted.
pub(crate) fn listing_record(owner_id: Uuid, title: &str) -> Listing {
    let now = Utc::now();
    Listing {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "A small commercial spot".to_string(),
        surface: 6.0,
        price: 150.0,
        address: "1 rue de la Paix".to_string(),
        postal_code: "75001".to_string(),
        city: "Paris".to_string(),
        main_category: MainCategory::VendingMachine,
        sub_category: Some(SubCategory::Food),
        specific_type: Some("PIZZA".to_string()),
        space_type: SpaceType::Indoor,
        has_concrete_slab: false,
        has_electricity: false,
        has_water: false,
        internet_type: None,
        access: AccessHours::Scheduled {
            opening_time: "09:00".to_string(),
            closing_time: "19:00".to_string(),
        },
        status: ListingStatus::Active,
        owner_id,
        created_at: now,
        updated_at: now,
    }
}
