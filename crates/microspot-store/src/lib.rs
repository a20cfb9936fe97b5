//! # microspot-store
//!
//! SQLite persistence for the MicroSpot marketplace.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model: users, sessions, listings (with images), favorites, messages and
//! notifications.  The two pieces of real logic live in [`query`] (the
//! listing search filter builder) and [`conversations`] (folding flat
//! message rows into per-listing, per-counterpart threads).

pub mod categories;
pub mod conversations;
pub mod database;
pub mod favorites;
pub mod listings;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod notifications;
pub mod query;
pub mod sessions;
pub mod users;

mod error;

#[cfg(test)]
pub(crate) mod test_support;

pub use conversations::{conversation_id, parse_conversation_id, Conversation};
pub use database::Database;
pub use error::StoreError;
pub use listings::ListingUpdate;
pub use models::*;
pub use query::{AccessFilter, ListingFilter};
pub use users::{AccountImage, ProfileUpdate};
