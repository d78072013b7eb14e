use rusqlite::Connection;

use crate::models::{MessageRow, UserRef};
use crate::users::query_user_ref;
use crate::{Database, StoreResult};

impl Database {
    /// Append an immutable message row. No friendship check is made here:
    /// any account may message any other.
    pub fn create_message(
        &self,
        sender: &UserRef,
        receiver_id: i64,
        content: &str,
    ) -> StoreResult<MessageRow> {
        let now = crate::now_rfc3339();
        self.with_conn(|conn| {
            // Fails with NotFound on an unknown receiver.
            query_user_ref(conn, receiver_id)?;

            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, content, is_read, timestamp)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                (sender.id, receiver_id, content, &now),
            )?;

            Ok(MessageRow {
                id: conn.last_insert_rowid(),
                sender: sender.clone(),
                receiver_id,
                content: content.into(),
                is_read: false,
                timestamp: now,
            })
        })
    }

    /// Messages between two users in ascending timestamp order. With
    /// `after_id`, only rows with id strictly greater than the cursor;
    /// rowids are monotonic, so id order is chronological order.
    /// Listing also marks messages addressed to the caller as read.
    pub fn list_conversation(
        &self,
        user_id: i64,
        other_user_id: i64,
        after_id: Option<i64>,
    ) -> StoreResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                (user_id, other_user_id),
            )?;

            query_conversation(conn, user_id, other_user_id, after_id)
        })
    }
}

fn query_conversation(
    conn: &Connection,
    user_id: i64,
    other_user_id: i64,
    after_id: Option<i64>,
) -> StoreResult<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.receiver_id, m.content, m.is_read, m.timestamp,
                u.id, u.email, u.first_name, u.last_name
         FROM messages m
         JOIN users u ON u.id = m.sender_id
         WHERE ((m.sender_id = ?1 AND m.receiver_id = ?2)
             OR (m.sender_id = ?2 AND m.receiver_id = ?1))
           AND m.id > ?3
         ORDER BY m.timestamp ASC, m.id ASC",
    )?;

    let rows = stmt
        .query_map(
            rusqlite::params![user_id, other_user_id, after_id.unwrap_or(0)],
            |row| {
                Ok(MessageRow {
                    id: row.get(0)?,
                    receiver_id: row.get(1)?,
                    content: row.get(2)?,
                    is_read: row.get(3)?,
                    timestamp: row.get(4)?,
                    sender: UserRef {
                        id: row.get(5)?,
                        email: row.get(6)?,
                        first_name: row.get(7)?,
                        last_name: row.get(8)?,
                    },
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
