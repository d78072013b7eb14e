use rusqlite::Connection;

use amity_types::models::{FriendshipStatus, NotificationKind};

use crate::models::{FriendshipRow, UserRef};
use crate::notifications::insert_notification;
use crate::{Database, OptionalExt, StoreError, StoreResult, is_constraint_violation};

const FRIENDSHIP_SELECT: &str = "
    SELECT f.id, f.status, f.created_at,
           s.id, s.email, s.first_name, s.last_name,
           r.id, r.email, r.first_name, r.last_name
    FROM friendships f
    JOIN users s ON s.id = f.sender_id
    JOIN users r ON r.id = f.receiver_id";

impl Database {
    /// Create a PENDING friendship and, in the same transaction, the
    /// friend-request notification for the receiver. The symmetric
    /// (pair_lo, pair_hi) constraint rejects a duplicate in either
    /// direction, so a concurrent opposite-direction request loses at the
    /// storage layer.
    pub fn create_friendship(
        &self,
        sender: &UserRef,
        receiver: &UserRef,
    ) -> StoreResult<FriendshipRow> {
        if sender.id == receiver.id {
            return Err(StoreError::Validation("You cannot invite yourself.".into()));
        }

        let now = crate::now_rfc3339();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO friendships
                     (sender_id, receiver_id, status, created_at, pair_lo, pair_hi)
                 VALUES (?1, ?2, 'PENDING', ?3, ?4, ?5)",
                (
                    sender.id,
                    receiver.id,
                    &now,
                    sender.id.min(receiver.id),
                    sender.id.max(receiver.id),
                ),
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Validation("Friendship request already exists.".into())
                } else {
                    e.into()
                }
            })?;
            let id = tx.last_insert_rowid();

            insert_notification(
                &tx,
                receiver.id,
                NotificationKind::FriendRequest,
                &format!("{} sent you a friend request.", sender.first_name),
                &now,
            )?;

            tx.commit()?;

            Ok(FriendshipRow {
                id,
                sender: sender.clone(),
                receiver: receiver.clone(),
                status: FriendshipStatus::Pending.as_str().into(),
                created_at: now,
            })
        })
    }

    /// Accept or reject a pending request. Only the receiver may act, and
    /// only while the request is PENDING; accept/reject are terminal,
    /// which also guarantees the acceptance notification is written at
    /// most once.
    pub fn respond_friendship(
        &self,
        friendship_id: i64,
        actor_id: i64,
        accept: bool,
    ) -> StoreResult<FriendshipRow> {
        let now = crate::now_rfc3339();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut row = query_friendship(&tx, friendship_id)?
                .ok_or_else(|| StoreError::NotFound("Friendship not found.".into()))?;

            // Lookups are scoped to the caller's own rows, so an outsider
            // sees a 404, not a 403.
            if row.sender.id != actor_id && row.receiver.id != actor_id {
                return Err(StoreError::NotFound("Friendship not found.".into()));
            }
            if row.receiver.id != actor_id {
                let verb = if accept { "accept" } else { "reject" };
                return Err(StoreError::Forbidden(format!(
                    "You can only {verb} requests sent to you."
                )));
            }
            if FriendshipStatus::parse(&row.status) != Some(FriendshipStatus::Pending) {
                return Err(StoreError::Validation(
                    "Friend request has already been resolved.".into(),
                ));
            }

            let next = if accept {
                FriendshipStatus::Accepted
            } else {
                FriendshipStatus::Rejected
            };
            tx.execute(
                "UPDATE friendships SET status = ?1 WHERE id = ?2",
                (next.as_str(), friendship_id),
            )?;

            if accept {
                insert_notification(
                    &tx,
                    row.sender.id,
                    NotificationKind::FriendRequest,
                    &format!("{} accepted your friend request.", row.receiver.first_name),
                    &now,
                )?;
            }

            tx.commit()?;

            row.status = next.as_str().into();
            Ok(row)
        })
    }

    /// All friendships the user is a party to, newest first.
    pub fn list_friendships(&self, user_id: i64) -> StoreResult<Vec<FriendshipRow>> {
        self.with_conn(|conn| {
            query_friendships(
                conn,
                &format!(
                    "{FRIENDSHIP_SELECT}
                     WHERE f.sender_id = ?1 OR f.receiver_id = ?1
                     ORDER BY f.created_at DESC, f.id DESC"
                ),
                rusqlite::params![user_id],
            )
        })
    }

    /// The "other side" of every ACCEPTED friendship involving the user.
    pub fn list_friends(&self, user_id: i64) -> StoreResult<Vec<UserRef>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.email, u.first_name, u.last_name
                 FROM friendships f
                 JOIN users u ON u.id = CASE
                     WHEN f.sender_id = ?1 THEN f.receiver_id
                     ELSE f.sender_id
                 END
                 WHERE (f.sender_id = ?1 OR f.receiver_id = ?1)
                   AND f.status = 'ACCEPTED'
                 ORDER BY f.created_at DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(UserRef {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Requests received by the user that are still pending.
    pub fn list_pending_requests(&self, user_id: i64) -> StoreResult<Vec<FriendshipRow>> {
        self.with_conn(|conn| {
            query_friendships(
                conn,
                &format!(
                    "{FRIENDSHIP_SELECT}
                     WHERE f.receiver_id = ?1 AND f.status = 'PENDING'
                     ORDER BY f.created_at DESC, f.id DESC"
                ),
                rusqlite::params![user_id],
            )
        })
    }
}

fn query_friendship(conn: &Connection, id: i64) -> StoreResult<Option<FriendshipRow>> {
    let mut stmt = conn.prepare(&format!("{FRIENDSHIP_SELECT} WHERE f.id = ?1"))?;
    stmt.query_row([id], map_friendship_row).optional()
}

fn query_friendships(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<FriendshipRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_friendship_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_friendship_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendshipRow> {
    Ok(FriendshipRow {
        id: row.get(0)?,
        status: row.get(1)?,
        created_at: row.get(2)?,
        sender: UserRef {
            id: row.get(3)?,
            email: row.get(4)?,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
        },
        receiver: UserRef {
            id: row.get(7)?,
            email: row.get(8)?,
            first_name: row.get(9)?,
            last_name: row.get(10)?,
        },
    })
}
