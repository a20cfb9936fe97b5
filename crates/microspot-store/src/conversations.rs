//! Conversation derivation.
//!
//! A conversation is not a stored entity: it is the grouping of messages
//! by `(listing, counterpart)` for one user.  This module folds the flat
//! newest-first message list into those groups and implements the thread
//! fetch-and-mark-read operation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{ListingSummary, MessageWithParties, UserSummary};

/// A derived message thread between the queried user and one counterpart
/// about one listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// `"{listing_id}-{counterpart_id}"`, the key clients use to fetch the
    /// thread.
    pub id: String,
    pub listing: ListingSummary,
    pub other_user: UserSummary,
    pub messages: Vec<MessageWithParties>,
    pub last_message: MessageWithParties,
    /// Messages addressed to the queried user and still unread.
    pub unread_count: u32,
}

/// Build the conversation id for a listing/counterpart pair.
pub fn conversation_id(listing_id: Uuid, other_user_id: Uuid) -> String {
    format!("{listing_id}-{other_user_id}")
}

/// Parse a conversation id back into its listing/counterpart pair.
///
/// Both halves are hyphenated UUIDs, so the id is split at the fixed
/// separator position rather than on the first hyphen.
pub fn parse_conversation_id(id: &str) -> Option<(Uuid, Uuid)> {
    const UUID_LEN: usize = 36;
    let bytes = id.as_bytes();
    if bytes.len() != UUID_LEN * 2 + 1 || bytes[UUID_LEN] != b'-' {
        return None;
    }
    let listing_id = Uuid::parse_str(&id[..UUID_LEN]).ok()?;
    let other_user_id = Uuid::parse_str(&id[UUID_LEN + 1..]).ok()?;
    Some((listing_id, other_user_id))
}

/// Fold a newest-first message list into per-conversation groups.
///
/// The input ordering is load-bearing: `last_message` is taken from the
/// first message encountered per key, which is the most recent one exactly
/// because the feed is newest-first.  Output order is first-encounter
/// order, i.e. conversations with the most recent activity come first.
pub fn group_conversations(
    user_id: Uuid,
    messages_newest_first: Vec<MessageWithParties>,
) -> Vec<Conversation> {
    let mut conversations: Vec<Conversation> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for message in messages_newest_first {
        let is_user_sender = message.message.sender_id == user_id;
        let other_user = if is_user_sender {
            message.recipient.clone()
        } else {
            message.sender.clone()
        };
        let key = conversation_id(message.message.listing_id, other_user.id);
        let unread_for_user = !is_user_sender && !message.message.read;

        match index_by_key.get(&key) {
            Some(&i) => {
                if unread_for_user {
                    conversations[i].unread_count += 1;
                }
                conversations[i].messages.push(message);
            }
            None => {
                index_by_key.insert(key.clone(), conversations.len());
                conversations.push(Conversation {
                    id: key,
                    listing: message.listing.clone(),
                    other_user,
                    last_message: message.clone(),
                    messages: vec![message],
                    unread_count: if unread_for_user { 1 } else { 0 },
                });
            }
        }
    }

    conversations
}

impl Database {
    /// The user's conversations, most recently active first.
    pub fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let messages = self.messages_for_user(user_id)?;
        Ok(group_conversations(user_id, messages))
    }

    /// Return one thread oldest-first and mark its messages addressed to
    /// `reader_id` as read.
    ///
    /// The mark-read step is best-effort: if it fails after the read
    /// succeeded, the messages are returned anyway and the failure is
    /// logged.
    pub fn fetch_thread_and_mark_read(
        &self,
        listing_id: Uuid,
        other_user_id: Uuid,
        reader_id: Uuid,
    ) -> Result<Vec<MessageWithParties>> {
        let messages = self.thread_messages(listing_id, reader_id, other_user_id)?;

        match self.mark_thread_read(listing_id, other_user_id, reader_id) {
            Ok(updated) if updated > 0 => {
                tracing::debug!(
                    listing_id = %listing_id,
                    reader = %reader_id,
                    updated,
                    "marked thread messages as read"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    listing_id = %listing_id,
                    reader = %reader_id,
                    error = %e,
                    "failed to mark thread as read"
                );
            }
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{listing_record, new_message, new_user, test_db};

    #[test]
    fn conversation_id_round_trip() {
        let listing_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let id = conversation_id(listing_id, user_id);
        assert_eq!(parse_conversation_id(&id), Some((listing_id, user_id)));

        assert_eq!(parse_conversation_id("not-a-conversation"), None);
        assert_eq!(parse_conversation_id(""), None);
    }

    #[test]
    fn distinct_listings_make_distinct_conversations() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let first = listing_record(alice.id, "First spot");
        let second = listing_record(alice.id, "Second spot");
        db.create_listing(&first, &[]).unwrap();
        db.create_listing(&second, &[]).unwrap();

        new_message(&db, bob.id, alice.id, first.id, "about first", 0);
        new_message(&db, bob.id, alice.id, second.id, "about second", 1);

        let conversations = db.conversations_for_user(alice.id).unwrap();
        assert_eq!(conversations.len(), 2);
        // Most recently active first.
        assert_eq!(conversations[0].listing.title, "Second spot");
        assert_eq!(conversations[1].listing.title, "First spot");
        for conversation in &conversations {
            assert_eq!(conversation.other_user.name, "Bob");
            assert_eq!(conversation.messages.len(), 1);
        }
    }

    #[test]
    fn unread_count_only_counts_messages_to_the_user() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let listing = listing_record(alice.id, "Spot");
        db.create_listing(&listing, &[]).unwrap();

        new_message(&db, bob.id, alice.id, listing.id, "unread 1", 0);
        new_message(&db, alice.id, bob.id, listing.id, "own message", 1);
        let read_one = new_message(&db, bob.id, alice.id, listing.id, "read", 2);
        new_message(&db, bob.id, alice.id, listing.id, "unread 2", 3);

        db.conn()
            .execute(
                "UPDATE messages SET read = 1 WHERE id = ?1",
                rusqlite::params![read_one.id.to_string()],
            )
            .unwrap();

        let conversations = db.conversations_for_user(alice.id).unwrap();
        assert_eq!(conversations.len(), 1);
        let conversation = &conversations[0];
        assert_eq!(conversation.unread_count, 2);
        assert_eq!(conversation.messages.len(), 4);
        // Newest-first feed makes the first-encountered message the last one.
        assert_eq!(conversation.last_message.message.content, "unread 2");

        // Bob's view of the same thread: only Alice's message counts.
        let bobs = db.conversations_for_user(bob.id).unwrap();
        assert_eq!(bobs[0].unread_count, 1);
    }

    #[test]
    fn fetch_thread_marks_read_and_is_idempotent() {
        let mut db = test_db();
        let alice = new_user(&db, "Alice", "alice@example.fr");
        let bob = new_user(&db, "Bob", "bob@example.fr");
        let listing = listing_record(alice.id, "Spot");
        db.create_listing(&listing, &[]).unwrap();

        new_message(&db, bob.id, alice.id, listing.id, "Bonjour", 0);

        let thread = db
            .fetch_thread_and_mark_read(listing.id, bob.id, alice.id)
            .unwrap();
        assert_eq!(thread.len(), 1);
        // The returned snapshot predates the mark-read side effect.
        assert!(!thread[0].message.read);

        let conversations = db.conversations_for_user(alice.id).unwrap();
        assert_eq!(conversations[0].unread_count, 0);

        // Second call: still fine, still zero unread.
        let thread = db
            .fetch_thread_and_mark_read(listing.id, bob.id, alice.id)
            .unwrap();
        assert_eq!(thread.len(), 1);
        assert!(thread[0].message.read);
        let conversations = db.conversations_for_user(alice.id).unwrap();
        assert_eq!(conversations[0].unread_count, 0);
    }

    #[test]
    fn bonjour_merci_scenario() {
        let mut db = test_db();
        let a = new_user(&db, "A", "a@example.fr");
        let b = new_user(&db, "B", "b@example.fr");
        let listing = listing_record(b.id, "L1");
        db.create_listing(&listing, &[]).unwrap();

        // A sends "Bonjour" at T1; B replies "Merci" at T2.
        new_message(&db, a.id, b.id, listing.id, "Bonjour", 0);
        new_message(&db, b.id, a.id, listing.id, "Merci", 1);

        // B fetches the thread with A: oldest first, and "Bonjour" gets
        // marked read for B.
        let thread = db
            .fetch_thread_and_mark_read(listing.id, a.id, b.id)
            .unwrap();
        let contents: Vec<_> = thread.iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["Bonjour", "Merci"]);

        let conversations = db.conversations_for_user(b.id).unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].unread_count, 0);
        assert_eq!(conversations[0].last_message.message.content, "Merci");
    }
}
