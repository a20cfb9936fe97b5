//! Message persistence.
//!
//! Raw CRUD over the `messages` table.  Conversation grouping and the
//! fetch-and-mark-read thread operation live in [`crate::conversations`].

use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ListingSummary, Message, MessageWithParties, UserSummary};
use crate::users::{parse_timestamp, parse_uuid};

/// Message columns plus sender name, recipient name and listing title, in
/// [`row_to_message_with_parties`] order.
const MESSAGE_COLUMNS: &str = "m.id, m.content, m.sender_id, m.recipient_id, m.listing_id, \
     m.read, m.created_at, s.name, r.name, l.title";

const MESSAGE_JOINS: &str = "FROM messages m
     JOIN users s ON s.id = m.sender_id
     JOIN users r ON r.id = m.recipient_id
     JOIN listings l ON l.id = m.listing_id";

impl Database {
    /// Insert a new message.
    pub fn insert_message(&self, message: &Message) -> Result<()> {
        self.conn().execute(
            "INSERT INTO messages (id, content, sender_id, recipient_id, listing_id, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                message.id.to_string(),
                message.content,
                message.sender_id.to_string(),
                message.recipient_id.to_string(),
                message.listing_id.to_string(),
                message.read,
                message.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a message with its party summaries attached.
    pub fn get_message(&self, id: Uuid) -> Result<MessageWithParties> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} {MESSAGE_JOINS} WHERE m.id = ?1");
        self.conn()
            .query_row(&sql, params![id.to_string()], row_to_message_with_parties)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Every message where the user is sender or recipient, newest first.
    ///
    /// This ordering is load-bearing: the conversation aggregator derives
    /// each thread's `last_message` from the first row it encounters.
    pub fn messages_for_user(&self, user_id: Uuid) -> Result<Vec<MessageWithParties>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} {MESSAGE_JOINS}
             WHERE m.sender_id = ?1 OR m.recipient_id = ?1
             ORDER BY m.created_at DESC"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![user_id.to_string()], row_to_message_with_parties)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// All messages exchanged between two users about one listing, oldest
    /// first.
    pub fn thread_messages(
        &self,
        listing_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<Vec<MessageWithParties>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} {MESSAGE_JOINS}
             WHERE m.listing_id = ?1
               AND ((m.sender_id = ?2 AND m.recipient_id = ?3)
                 OR (m.sender_id = ?3 AND m.recipient_id = ?2))
             ORDER BY m.created_at ASC"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                listing_id.to_string(),
                user_a.to_string(),
                user_b.to_string()
            ],
            row_to_message_with_parties,
        )?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Mark as read every unread message in one thread that is addressed
    /// to `reader_id`.  Returns the number of rows updated; calling it
    /// again is a no-op.
    pub fn mark_thread_read(
        &self,
        listing_id: Uuid,
        other_user_id: Uuid,
        reader_id: Uuid,
    ) -> Result<usize> {
        let affected = self.conn().execute(
            "UPDATE messages SET read = 1
             WHERE listing_id = ?1
               AND sender_id = ?2
               AND recipient_id = ?3
               AND read = 0",
            params![
                listing_id.to_string(),
                other_user_id.to_string(),
                reader_id.to_string()
            ],
        )?;
        Ok(affected)
    }
}

/// Map a row selected with [`MESSAGE_COLUMNS`] to a [`MessageWithParties`].
fn row_to_message_with_parties(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageWithParties> {
    let id_str: String = row.get(0)?;
    let sender_str: String = row.get(2)?;
    let recipient_str: String = row.get(3)?;
    let listing_str: String = row.get(4)?;
    let created_str: String = row.get(6)?;

    let sender_id = parse_uuid(&sender_str, 2)?;
    let recipient_id = parse_uuid(&recipient_str, 3)?;
    let listing_id = parse_uuid(&listing_str, 4)?;

    Ok(MessageWithParties {
        message: Message {
            id: parse_uuid(&id_str, 0)?,
            content: row.get(1)?,
            sender_id,
            recipient_id,
            listing_id,
            read: row.get(5)?,
            created_at: parse_timestamp(&created_str, 6)?,
        },
        sender: UserSummary {
            id: sender_id,
            name: row.get(7)?,
        },
        recipient: UserSummary {
            id: recipient_id,
            name: row.get(8)?,
        },
        listing: ListingSummary {
            id: listing_id,
            title: row.get(9)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{listing_record, new_message, new_user, test_db};

    #[test]
    fn insert_and_fetch_with_parties() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let listing = listing_record(alice.id, "Spot");
        db.create_listing(&listing, &[]).unwrap();

        let message = new_message(&db, bob.id, alice.id, listing.id, "Bonjour", 0);

        let fetched = db.get_message(message.id).unwrap();
        assert_eq!(fetched.message.content, "Bonjour");
        assert_eq!(fetched.sender.name, "Bob");
        assert_eq!(fetched.recipient.name, "Alice");
        assert_eq!(fetched.listing.title, "Spot");
        assert!(!fetched.message.read);
    }

    #[test]
    fn user_messages_are_newest_first() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let listing = listing_record(alice.id, "Spot");
        db.create_listing(&listing, &[]).unwrap();

        new_message(&db, bob.id, alice.id, listing.id, "first", 0);
        new_message(&db, alice.id, bob.id, listing.id, "second", 1);
        new_message(&db, bob.id, alice.id, listing.id, "third", 2);

        let messages = db.messages_for_user(alice.id).unwrap();
        let contents: Vec<_> = messages.iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[test]
    fn thread_scope_and_order() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let carol = new_user(&db, "Carol", "carol@example.fr");
        let listing = listing_record(alice.id, "Spot");
        let other = listing_record(alice.id, "Other spot");
        db.create_listing(&listing, &[]).unwrap();
        db.create_listing(&other, &[]).unwrap();

        new_message(&db, bob.id, alice.id, listing.id, "in thread", 0);
        new_message(&db, alice.id, bob.id, listing.id, "reply", 1);
        new_message(&db, carol.id, alice.id, listing.id, "other party", 2);
        new_message(&db, bob.id, alice.id, other.id, "other listing", 3);

        let thread = db.thread_messages(listing.id, alice.id, bob.id).unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["in thread", "reply"]);
    }

    #[test]
    fn mark_read_is_scoped_and_idempotent() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let carol = new_user(&db, "Carol", "carol@example.fr");
        let listing = listing_record(alice.id, "Spot");
        db.create_listing(&listing, &[]).unwrap();

        let from_bob = new_message(&db, bob.id, alice.id, listing.id, "from bob", 0);
        let from_carol = new_message(&db, carol.id, alice.id, listing.id, "from carol", 1);

        assert_eq!(db.mark_thread_read(listing.id, bob.id, alice.id).unwrap(), 1);
        assert!(db.get_message(from_bob.id).unwrap().message.read);
        // Carol's thread is untouched.
        assert!(!db.get_message(from_carol.id).unwrap().message.read);
        // Second call finds nothing to update.
        assert_eq!(db.mark_thread_read(listing.id, bob.id, alice.id).unwrap(), 0);
    }
}
