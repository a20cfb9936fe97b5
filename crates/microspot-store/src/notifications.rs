//! CRUD operations for [`Notification`] records.

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Notification;
use crate::users::{parse_timestamp, parse_uuid};

/// How many notifications the list endpoint returns at most.
pub const NOTIFICATION_PAGE_SIZE: u32 = 50;

impl Database {
    /// Insert a new notification.
    pub fn create_notification(&self, notification: &Notification) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notifications (id, user_id, kind, title, content, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                notification.id.to_string(),
                notification.user_id.to_string(),
                notification.kind,
                notification.title,
                notification.content,
                notification.read,
                notification.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// The user's newest notifications, capped at
    /// [`NOTIFICATION_PAGE_SIZE`].
    pub fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, kind, title, content, read, created_at
             FROM notifications
             WHERE user_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(
            params![user_id.to_string(), NOTIFICATION_PAGE_SIZE],
            row_to_notification,
        )?;

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    /// Flip the read flag of one notification, scoped to its owner.
    /// Another user's notification behaves as absent.
    pub fn set_notification_read(&self, id: Uuid, user_id: Uuid, read: bool) -> Result<Notification> {
        let affected = self.conn().execute(
            "UPDATE notifications SET read = ?3 WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id.to_string(), read],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        self.conn()
            .query_row(
                "SELECT id, user_id, kind, title, content, read, created_at
                 FROM notifications WHERE id = ?1",
                params![id.to_string()],
                row_to_notification,
            )
            .map_err(StoreError::Sqlite)
    }
}

fn row_to_notification(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let id_str: String = row.get(0)?;
    let user_str: String = row.get(1)?;
    let created_str: String = row.get(6)?;

    Ok(Notification {
        id: parse_uuid(&id_str, 0)?,
        user_id: parse_uuid(&user_str, 1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        read: row.get(5)?,
        created_at: parse_timestamp(&created_str, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_user, test_db};
    use chrono::{Duration, Utc};

    fn notification(user_id: Uuid, title: &str, minutes: i64) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            kind: "NEW_MESSAGE".to_string(),
            title: title.to_string(),
            content: "content".to_string(),
            read: false,
            created_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn list_is_newest_first_and_capped() {
        let db = test_db();
        let user = new_user(&db, "Alice", "alice@example.fr");

        for i in 0..(NOTIFICATION_PAGE_SIZE as i64 + 5) {
            db.create_notification(&notification(user.id, &format!("n{i}"), i))
                .unwrap();
        }

        let listed = db.notifications_for_user(user.id).unwrap();
        assert_eq!(listed.len(), NOTIFICATION_PAGE_SIZE as usize);
        assert_eq!(listed[0].title, "n54");
    }

    #[test]
    fn read_flag_is_owner_scoped() {
        let db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");

        let n = notification(alice.id, "hello", 0);
        db.create_notification(&n).unwrap();

        // Bob cannot touch Alice's notification.
        assert!(matches!(
            db.set_notification_read(n.id, bob.id, true),
            Err(StoreError::NotFound)
        ));

        let updated = db.set_notification_read(n.id, alice.id, true).unwrap();
        assert!(updated.read);
    }
}
