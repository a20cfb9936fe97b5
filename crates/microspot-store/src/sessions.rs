//! Bearer session persistence.
//!
//! Login creates a row, logout deletes it, and a background task in the
//! server purges rows past their expiry.

use chrono::{Duration, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Session;
use crate::users::{parse_timestamp, parse_uuid};

/// How long a session stays valid after login.
pub const SESSION_TTL_DAYS: i64 = 30;

impl Database {
    /// Issue a fresh session for a user.
    pub fn create_session(&self, user_id: Uuid) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            token: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };

        self.conn().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token.to_string(),
                session.user_id.to_string(),
                session.created_at.to_rfc3339(),
                session.expires_at.to_rfc3339(),
            ],
        )?;

        Ok(session)
    }

    /// Resolve a bearer token to its session.  Expired sessions resolve to
    /// [`StoreError::NotFound`] even if the row has not been purged yet.
    pub fn get_session(&self, token: Uuid) -> Result<Session> {
        let session = self
            .conn()
            .query_row(
                "SELECT token, user_id, created_at, expires_at
                 FROM sessions WHERE token = ?1",
                params![token.to_string()],
                row_to_session,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        if session.expires_at <= Utc::now() {
            return Err(StoreError::NotFound);
        }
        Ok(session)
    }

    /// Delete a session (logout).  Returns `true` if a row was deleted.
    pub fn delete_session(&self, token: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE token = ?1",
            params![token.to_string()],
        )?;
        Ok(affected > 0)
    }

    /// Remove every expired session.  Returns the number purged.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(affected)
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let token_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let created_str: String = row.get(2)?;
    let expires_str: String = row.get(3)?;

    Ok(Session {
        token: parse_uuid(&token_str, 0)?,
        user_id: parse_uuid(&user_str, 1)?,
        created_at: parse_timestamp(&created_str, 2)?,
        expires_at: parse_timestamp(&expires_str, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_user, test_db};

    #[test]
    fn session_round_trip() {
        let db = test_db();
        let user = new_user(&db, "Alice", "alice@example.fr");

        let session = db.create_session(user.id).unwrap();
        let resolved = db.get_session(session.token).unwrap();
        assert_eq!(resolved.user_id, user.id);
    }

    #[test]
    fn logout_invalidates_token() {
        let db = test_db();
        let user = new_user(&db, "Alice", "alice@example.fr");
        let session = db.create_session(user.id).unwrap();

        assert!(db.delete_session(session.token).unwrap());
        assert!(matches!(
            db.get_session(session.token),
            Err(StoreError::NotFound)
        ));
        // Second logout is a no-op.
        assert!(!db.delete_session(session.token).unwrap());
    }

    #[test]
    fn expired_sessions_are_invisible_and_purgeable() {
        let db = test_db();
        let user = new_user(&db, "Alice", "alice@example.fr");
        let session = db.create_session(user.id).unwrap();

        // Force the expiry into the past.
        db.conn()
            .execute(
                "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
                params![
                    (Utc::now() - Duration::hours(1)).to_rfc3339(),
                    session.token.to_string()
                ],
            )
            .unwrap();

        assert!(matches!(
            db.get_session(session.token),
            Err(StoreError::NotFound)
        ));
        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
    }
}
