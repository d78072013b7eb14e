use rusqlite::Connection;

use amity_types::models::NotificationKind;

use crate::models::NotificationRow;
use crate::{Database, StoreError, StoreResult};

/// Shared by the friendship writes so the notification lands in the same
/// transaction as the event that caused it.
pub(crate) fn insert_notification(
    conn: &Connection,
    recipient_id: i64,
    kind: NotificationKind,
    content: &str,
    now: &str,
) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO notifications (recipient_id, notification_type, content, is_read, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        (recipient_id, kind.as_str(), content, now),
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    pub fn create_notification(
        &self,
        recipient_id: i64,
        kind: NotificationKind,
        content: &str,
    ) -> StoreResult<NotificationRow> {
        let now = crate::now_rfc3339();
        self.with_conn(|conn| {
            let id = insert_notification(conn, recipient_id, kind, content, &now)?;
            Ok(NotificationRow {
                id,
                recipient_id,
                notification_type: kind.as_str().into(),
                content: content.into(),
                is_read: false,
                created_at: now,
            })
        })
    }

    /// The user's notifications, newest first.
    pub fn list_notifications(&self, recipient_id: i64) -> StoreResult<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, recipient_id, notification_type, content, is_read, created_at
                 FROM notifications
                 WHERE recipient_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;

            let rows = stmt
                .query_map([recipient_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        recipient_id: row.get(1)?,
                        notification_type: row.get(2)?,
                        content: row.get(3)?,
                        is_read: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Flip the read flag. Scoped to the recipient, so acting on someone
    /// else's notification is a NotFound.
    pub fn mark_notification_read(&self, id: i64, recipient_id: i64) -> StoreResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND recipient_id = ?2",
                (id, recipient_id),
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound("Notification not found.".into()));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use amity_types::models::NotificationKind;

    use crate::{Database, StoreError};

    #[test]
    fn mark_read_is_scoped_to_the_recipient() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("a@example.com", "hash", "", "").unwrap();
        let b = db.create_user("b@example.com", "hash", "", "").unwrap();

        let n = db
            .create_notification(a.id, NotificationKind::General, "Test Notification")
            .unwrap();
        assert!(!n.is_read);

        let err = db.mark_notification_read(n.id, b.id).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        db.mark_notification_read(n.id, a.id).unwrap();
        assert!(db.list_notifications(a.id).unwrap()[0].is_read);
    }
}
