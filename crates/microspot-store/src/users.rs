//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

/// The allow-listed profile fields a user may change about themselves.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub email_notifications: Option<bool>,
}

/// Which of the two account images to replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountImage {
    Profile,
    Cover,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user.  Returns [`StoreError::Conflict`] when the email
    /// is already taken.
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, password_hash, display_name, bio,
                                    phone_number, email_notifications, profile_image,
                                    cover_image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email,
                    user.password_hash,
                    user.display_name,
                    user.bio,
                    user.phone_number,
                    user.email_notifications,
                    user.profile_image,
                    user.cover_image,
                    user.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::from_sqlite(e, "email already registered"))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by UUID.
    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, display_name, bio, phone_number,
                        email_notifications, profile_image, cover_image, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Fetch a single user by email (the login identifier).
    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, display_name, bio, phone_number,
                        email_notifications, profile_image, cover_image, created_at
                 FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .map_err(not_found)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a profile update and return the fresh record.  Fields left as
    /// `None` are not touched.
    pub fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let affected = self.conn().execute(
            "UPDATE users SET
                 display_name        = COALESCE(?2, display_name),
                 bio                 = COALESCE(?3, bio),
                 phone_number        = COALESCE(?4, phone_number),
                 email_notifications = COALESCE(?5, email_notifications)
             WHERE id = ?1",
            params![
                id.to_string(),
                update.display_name,
                update.bio,
                update.phone_number,
                update.email_notifications,
            ],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }

    /// Replace the profile or cover image URL and return the fresh record.
    pub fn set_account_image(&self, id: Uuid, which: AccountImage, url: &str) -> Result<User> {
        let sql = match which {
            AccountImage::Profile => "UPDATE users SET profile_image = ?2 WHERE id = ?1",
            AccountImage::Cover => "UPDATE users SET cover_image = ?2 WHERE id = ?1",
        };
        let affected = self.conn().execute(sql, params![id.to_string(), url])?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Map a `rusqlite::Row` to a [`User`].
pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let created_str: String = row.get(10)?;

    Ok(User {
        id: parse_uuid(&id_str, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        display_name: row.get(4)?,
        bio: row.get(5)?,
        phone_number: row.get(6)?,
        email_notifications: row.get(7)?,
        profile_image: row.get(8)?,
        cover_image: row.get(9)?,
        created_at: parse_timestamp(&created_str, 10)?,
    })
}

/// Parse a UUID column, mapping failure to a rusqlite conversion error.
pub(crate) fn parse_uuid(s: &str, column: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse an RFC-3339 timestamp column.
pub(crate) fn parse_timestamp(s: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
