//! v001 -- Initial schema creation.
//!
//! Creates the seven core tables: `users`, `sessions`, `listings`,
//! `images`, `favorites`, `messages`, and `notifications`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id                  TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name                TEXT NOT NULL,
    email               TEXT NOT NULL UNIQUE,
    password_hash       TEXT NOT NULL,
    display_name        TEXT,
    bio                 TEXT,
    phone_number        TEXT,
    email_notifications INTEGER NOT NULL DEFAULT 1,  -- boolean 0/1
    profile_image       TEXT,
    cover_image         TEXT,
    created_at          TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Sessions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,            -- UUID v4 bearer token
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);

-- ----------------------------------------------------------------
-- Listings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS listings (
    id                TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    title             TEXT NOT NULL,
    description       TEXT NOT NULL,
    surface           REAL NOT NULL,                 -- square meters, > 0
    price             REAL NOT NULL,                 -- EUR / month, >= 0
    address           TEXT NOT NULL,
    postal_code       TEXT NOT NULL,
    city              TEXT NOT NULL,
    main_category     TEXT NOT NULL,                 -- VENDING_MACHINE | KIOSK | ...
    sub_category      TEXT,                          -- closed set per main_category
    specific_type     TEXT,
    space_type        TEXT NOT NULL,                 -- INDOOR | OUTDOOR | MIXED
    has_concrete_slab INTEGER NOT NULL DEFAULT 0,
    has_electricity   INTEGER NOT NULL DEFAULT 0,
    has_water         INTEGER NOT NULL DEFAULT 0,
    internet_type     TEXT,
    is_24_7           INTEGER NOT NULL DEFAULT 0,
    opening_time      TEXT,                          -- "HH:MM", NULL when is_24_7
    closing_time      TEXT,
    status            TEXT NOT NULL DEFAULT 'ACTIVE',
    owner_id          TEXT NOT NULL,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE,

    CHECK (
        (is_24_7 = 1 AND opening_time IS NULL AND closing_time IS NULL) OR
        (is_24_7 = 0 AND opening_time IS NOT NULL AND closing_time IS NOT NULL)
    )
);

CREATE INDEX IF NOT EXISTS idx_listings_status_created
    ON listings(status, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_listings_owner_id ON listings(owner_id);

-- ----------------------------------------------------------------
-- Images
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS images (
    id         TEXT PRIMARY KEY NOT NULL,            -- UUID v4
    url        TEXT NOT NULL,
    public_id  TEXT NOT NULL,                        -- storage identifier
    listing_id TEXT NOT NULL,
    position   INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (listing_id) REFERENCES listings(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_images_listing_id ON images(listing_id);

-- ----------------------------------------------------------------
-- Favorites
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS favorites (
    user_id    TEXT NOT NULL,
    listing_id TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (user_id, listing_id),
    FOREIGN KEY (user_id)    REFERENCES users(id)    ON DELETE CASCADE,
    FOREIGN KEY (listing_id) REFERENCES listings(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id           TEXT PRIMARY KEY NOT NULL,          -- UUID v4
    content      TEXT NOT NULL,
    sender_id    TEXT NOT NULL,
    recipient_id TEXT NOT NULL,
    listing_id   TEXT NOT NULL,
    read         INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,

    FOREIGN KEY (sender_id)    REFERENCES users(id)    ON DELETE CASCADE,
    FOREIGN KEY (recipient_id) REFERENCES users(id)    ON DELETE CASCADE,
    FOREIGN KEY (listing_id)   REFERENCES listings(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_sender_ts
    ON messages(sender_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_recipient_ts
    ON messages(recipient_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_messages_listing_id ON messages(listing_id);

-- ----------------------------------------------------------------
-- Notifications
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS notifications (
    id         TEXT PRIMARY KEY NOT NULL,            -- UUID v4
    user_id    TEXT NOT NULL,
    kind       TEXT NOT NULL,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    read       INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notifications_user_ts
    ON notifications(user_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
