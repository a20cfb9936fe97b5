//! Favorite (bookmark) operations.
//!
//! A favorite is the unique `(user, listing)` pair.  Users cannot favorite
//! their own listings; the uniqueness constraint turns a second attempt
//! into [`StoreError::Conflict`].

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Favorite, FavoriteWithListing};

impl Database {
    /// Bookmark a listing for a user.
    ///
    /// Fails with [`StoreError::NotFound`] when the listing does not
    /// exist, [`StoreError::Rejected`] when the user owns it, and
    /// [`StoreError::Conflict`] when the favorite already exists.
    pub fn add_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<Favorite> {
        let owner_id: String = self
            .conn()
            .query_row(
                "SELECT owner_id FROM listings WHERE id = ?1",
                params![listing_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        if owner_id == user_id.to_string() {
            return Err(StoreError::Rejected(
                "cannot favorite your own listing".into(),
            ));
        }

        let favorite = Favorite {
            user_id,
            listing_id,
            created_at: Utc::now(),
        };

        self.conn()
            .execute(
                "INSERT INTO favorites (user_id, listing_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    favorite.user_id.to_string(),
                    favorite.listing_id.to_string(),
                    favorite.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::from_sqlite(e, "listing is already a favorite"))?;

        Ok(favorite)
    }

    /// Remove a bookmark.  Fails with [`StoreError::NotFound`] when it was
    /// never added.
    pub fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND listing_id = ?2",
            params![user_id.to_string(), listing_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// The user's favorites with their listings attached, newest bookmark
    /// first.
    pub fn favorites_for_user(&self, user_id: Uuid) -> Result<Vec<FavoriteWithListing>> {
        let mut stmt = self.conn().prepare(
            "SELECT listing_id, created_at FROM favorites
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            let listing_str: String = row.get(0)?;
            let created_str: String = row.get(1)?;
            Ok((
                crate::users::parse_uuid(&listing_str, 0)?,
                crate::users::parse_timestamp(&created_str, 1)?,
            ))
        })?;

        let mut favorites = Vec::new();
        for row in rows {
            let (listing_id, created_at) = row?;
            favorites.push(FavoriteWithListing {
                user_id,
                listing_id,
                created_at,
                listing: self.get_listing(listing_id)?,
            });
        }
        Ok(favorites)
    }
}
