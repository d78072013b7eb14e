use rusqlite::Connection;
use tracing::info;

use crate::StoreResult;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            first_name      TEXT NOT NULL DEFAULT '',
            last_name       TEXT NOT NULL DEFAULT '',
            is_staff        INTEGER NOT NULL DEFAULT 0,
            is_superuser    INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tokens (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            token       TEXT NOT NULL UNIQUE,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- pair_lo/pair_hi hold the min/max of (sender_id, receiver_id):
        -- one symmetric key enforces at most one friendship per unordered
        -- pair, in either direction.
        CREATE TABLE IF NOT EXISTS friendships (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            receiver_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status      TEXT NOT NULL DEFAULT 'PENDING',
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            pair_lo     INTEGER NOT NULL,
            pair_hi     INTEGER NOT NULL,
            UNIQUE(pair_lo, pair_hi)
        );

        CREATE INDEX IF NOT EXISTS idx_friendships_receiver
            ON friendships(receiver_id, status);

        CREATE TABLE IF NOT EXISTS messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            receiver_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            is_read     INTEGER NOT NULL DEFAULT 0,
            timestamp   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages(sender_id, receiver_id, id);

        CREATE TABLE IF NOT EXISTS notifications (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            notification_type   TEXT NOT NULL DEFAULT 'general',
            content             TEXT NOT NULL,
            is_read             INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(recipient_id, created_at);

        CREATE TABLE IF NOT EXISTS rooms (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            created_by  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            modified_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(created_by, name)
        );

        CREATE TABLE IF NOT EXISTS room_members (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            room_id     INTEGER NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status      TEXT NOT NULL DEFAULT 'INVITED',
            invited_on  TEXT NOT NULL,
            accepted_on TEXT,
            rejected_on TEXT,
            removed_on  TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            modified_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- At most one INVITED/ACCEPTED row per (room, user); rejected or
        -- removed rows do not block re-invitation.
        CREATE UNIQUE INDEX IF NOT EXISTS idx_room_members_active
            ON room_members(room_id, user_id)
            WHERE status IN ('INVITED', 'ACCEPTED');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
