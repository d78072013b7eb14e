use rusqlite::Connection;

use amity_types::models::MemberStatus;

use crate::models::{RoomMemberRow, RoomRow, UserRef};
use crate::users::query_user_ref;
use crate::{Database, OptionalExt, StoreError, StoreResult, is_constraint_violation};

const MAX_ROOM_NAME: usize = 15;

const MEMBER_SELECT: &str = "
    SELECT m.id, m.room_id, m.status,
           m.invited_on, m.accepted_on, m.rejected_on, m.removed_on,
           u.id, u.email, u.first_name, u.last_name
    FROM room_members m
    JOIN users u ON u.id = m.user_id";

impl Database {
    pub fn create_room(&self, owner_id: i64, name: &str) -> StoreResult<RoomRow> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_ROOM_NAME {
            return Err(StoreError::Validation(format!(
                "Room name must be between 1 and {MAX_ROOM_NAME} characters."
            )));
        }

        let now = crate::now_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rooms (name, created_by, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?3)",
                (name, owner_id, &now),
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict("You already have a room with this name.".into())
                } else {
                    e.into()
                }
            })?;

            Ok(RoomRow {
                id: conn.last_insert_rowid(),
                name: name.into(),
                created_by: owner_id,
                created_at: now,
            })
        })
    }

    /// Rooms the user owns or holds an active membership in.
    pub fn list_rooms(&self, user_id: i64) -> StoreResult<Vec<RoomRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT r.id, r.name, r.created_by, r.created_at
                 FROM rooms r
                 LEFT JOIN room_members m ON m.room_id = r.id AND m.user_id = ?1
                 WHERE r.created_by = ?1
                    OR m.status IN ('INVITED', 'ACCEPTED')
                 ORDER BY r.created_at DESC, r.id DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(RoomRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_by: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Invite a user into a room (owner only). A fresh INVITED row is
    /// created; prior REJECTED/REMOVED rows do not block re-invitation,
    /// while a live INVITED/ACCEPTED one does.
    pub fn invite_member(
        &self,
        room_id: i64,
        actor_id: i64,
        user_id: i64,
    ) -> StoreResult<RoomMemberRow> {
        let now = crate::now_rfc3339();
        self.with_conn(|conn| {
            let room = query_room(conn, room_id)?
                .ok_or_else(|| StoreError::NotFound("Room not found.".into()))?;
            if room.created_by != actor_id {
                return Err(StoreError::Forbidden(
                    "Only the room owner can invite members.".into(),
                ));
            }
            let user = query_user_ref(conn, user_id)?;

            conn.execute(
                "INSERT INTO room_members
                     (room_id, user_id, status, invited_on, created_at, modified_at)
                 VALUES (?1, ?2, 'INVITED', ?3, ?3, ?3)",
                (room_id, user_id, &now),
            )
            .map_err(|e| {
                // Partial unique index on active memberships.
                if is_constraint_violation(&e) {
                    StoreError::Conflict(
                        "User already has an active membership in this room.".into(),
                    )
                } else {
                    e.into()
                }
            })?;

            Ok(RoomMemberRow {
                id: conn.last_insert_rowid(),
                room_id,
                user,
                status: MemberStatus::Invited.as_str().into(),
                invited_on: now,
                accepted_on: None,
                rejected_on: None,
                removed_on: None,
            })
        })
    }

    /// Accept or reject one's own invitation.
    pub fn respond_membership(
        &self,
        room_id: i64,
        actor_id: i64,
        accept: bool,
    ) -> StoreResult<RoomMemberRow> {
        let next = if accept {
            MemberStatus::Accepted
        } else {
            MemberStatus::Rejected
        };
        self.with_conn(|conn| transition_member(conn, room_id, actor_id, next))
    }

    /// Remove a member from a room (owner only).
    pub fn remove_member(
        &self,
        room_id: i64,
        actor_id: i64,
        user_id: i64,
    ) -> StoreResult<RoomMemberRow> {
        self.with_conn(|conn| {
            let room = query_room(conn, room_id)?
                .ok_or_else(|| StoreError::NotFound("Room not found.".into()))?;
            if room.created_by != actor_id {
                return Err(StoreError::Forbidden(
                    "Only the room owner can remove members.".into(),
                ));
            }
            transition_member(conn, room_id, user_id, MemberStatus::Removed)
        })
    }
}

/// Apply a status transition to the user's latest membership row, setting
/// exactly the matching `*_on` timestamp and leaving the others untouched.
fn transition_member(
    conn: &Connection,
    room_id: i64,
    user_id: i64,
    next: MemberStatus,
) -> StoreResult<RoomMemberRow> {
    let mut row = query_latest_member(conn, room_id, user_id)?
        .ok_or_else(|| StoreError::NotFound("Membership not found.".into()))?;

    let current = MemberStatus::parse(&row.status)
        .ok_or_else(|| StoreError::Validation(format!("Corrupt member status: {}", row.status)))?;
    current
        .check_transition(next)
        .map_err(|e| StoreError::Validation(e.to_string()))?;

    let column = match next {
        MemberStatus::Accepted => "accepted_on",
        MemberStatus::Rejected => "rejected_on",
        MemberStatus::Removed => "removed_on",
        // Re-invitation goes through invite_member, never through here.
        MemberStatus::Invited => {
            return Err(StoreError::Validation(
                "Cannot transition back to invited.".into(),
            ));
        }
    };

    let now = crate::now_rfc3339();
    conn.execute(
        &format!("UPDATE room_members SET status = ?1, {column} = ?2, modified_at = ?2 WHERE id = ?3"),
        (next.as_str(), &now, row.id),
    )?;

    row.status = next.as_str().into();
    match next {
        MemberStatus::Accepted => row.accepted_on = Some(now),
        MemberStatus::Rejected => row.rejected_on = Some(now),
        MemberStatus::Removed => row.removed_on = Some(now),
        MemberStatus::Invited => unreachable!(),
    }
    Ok(row)
}

fn query_room(conn: &Connection, id: i64) -> StoreResult<Option<RoomRow>> {
    conn.query_row(
        "SELECT id, name, created_by, created_at FROM rooms WHERE id = ?1",
        [id],
        |row| {
            Ok(RoomRow {
                id: row.get(0)?,
                name: row.get(1)?,
                created_by: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}

fn query_latest_member(
    conn: &Connection,
    room_id: i64,
    user_id: i64,
) -> StoreResult<Option<RoomMemberRow>> {
    let mut stmt = conn.prepare(&format!(
        "{MEMBER_SELECT}
         WHERE m.room_id = ?1 AND m.user_id = ?2
         ORDER BY m.id DESC LIMIT 1"
    ))?;

    stmt.query_row((room_id, user_id), |row| {
        Ok(RoomMemberRow {
            id: row.get(0)?,
            room_id: row.get(1)?,
            status: row.get(2)?,
            invited_on: row.get(3)?,
            accepted_on: row.get(4)?,
            rejected_on: row.get(5)?,
            removed_on: row.get(6)?,
            user: UserRef {
                id: row.get(7)?,
                email: row.get(8)?,
                first_name: row.get(9)?,
                last_name: row.get(10)?,
            },
        })
    })
    .optional()
}

#[cfg(test)]
mod tests {
    use crate::{Database, StoreError};

    fn setup() -> (Database, i64, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("owner@example.com", "hash", "O", "").unwrap();
        let member = db
            .create_user("member@example.com", "hash", "M", "")
            .unwrap();
        let room = db.create_room(owner.id, "TestRoom").unwrap();
        (db, owner.id, member.id, room.id)
    }

    #[test]
    fn room_name_unique_per_owner() {
        let (db, owner, member, _) = setup();

        let err = db.create_room(owner, "TestRoom").unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // A different owner may reuse the name.
        db.create_room(member, "TestRoom").unwrap();
    }

    #[test]
    fn room_name_length_is_bounded() {
        let (db, owner, _, _) = setup();
        assert!(matches!(
            db.create_room(owner, "").unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            db.create_room(owner, "a-name-that-is-way-too-long").unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[test]
    fn user_can_be_invited_once_while_active() {
        let (db, owner, member, room) = setup();

        db.invite_member(room, owner, member).unwrap();
        let err = db.invite_member(room, owner, member).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn only_owner_invites_and_removes() {
        let (db, _, member, room) = setup();

        let err = db.invite_member(room, member, member).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        let err = db.remove_member(room, member, member).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn invited_member_can_accept_and_only_accepted_on_is_set() {
        let (db, owner, member, room) = setup();
        db.invite_member(room, owner, member).unwrap();

        let m = db.respond_membership(room, member, true).unwrap();
        assert_eq!(m.status, "ACCEPTED");
        assert!(m.accepted_on.is_some());
        assert!(m.rejected_on.is_none());
        assert!(m.removed_on.is_none());
    }

    #[test]
    fn invited_member_can_reject_and_only_rejected_on_is_set() {
        let (db, owner, member, room) = setup();
        db.invite_member(room, owner, member).unwrap();

        let m = db.respond_membership(room, member, false).unwrap();
        assert_eq!(m.status, "REJECTED");
        assert!(m.rejected_on.is_some());
        assert!(m.accepted_on.is_none());
    }

    #[test]
    fn accepted_member_cannot_reject_or_reaccept() {
        let (db, owner, member, room) = setup();
        db.invite_member(room, owner, member).unwrap();
        db.respond_membership(room, member, true).unwrap();

        assert!(matches!(
            db.respond_membership(room, member, false).unwrap_err(),
            StoreError::Validation(_)
        ));
        assert!(matches!(
            db.respond_membership(room, member, true).unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[test]
    fn rejected_member_cannot_accept() {
        let (db, owner, member, room) = setup();
        db.invite_member(room, owner, member).unwrap();
        db.respond_membership(room, member, false).unwrap();

        let err = db.respond_membership(room, member, true).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn removal_only_from_invited_or_accepted() {
        let (db, owner, member, room) = setup();
        db.invite_member(room, owner, member).unwrap();

        // Invited -> removed is legal.
        let m = db.remove_member(room, owner, member).unwrap();
        assert_eq!(m.status, "REMOVED");
        assert!(m.removed_on.is_some());

        // Removed -> removed is not.
        let err = db.remove_member(room, owner, member).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn removed_member_cannot_accept() {
        let (db, owner, member, room) = setup();
        db.invite_member(room, owner, member).unwrap();
        db.respond_membership(room, member, true).unwrap();
        db.remove_member(room, owner, member).unwrap();

        let err = db.respond_membership(room, member, true).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn reinvite_after_rejection_or_removal_starts_fresh() {
        let (db, owner, member, room) = setup();

        let first = db.invite_member(room, owner, member).unwrap();
        db.respond_membership(room, member, false).unwrap();

        let second = db.invite_member(room, owner, member).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.status, "INVITED");
        assert!(second.accepted_on.is_none());

        db.respond_membership(room, member, true).unwrap();
        db.remove_member(room, owner, member).unwrap();

        let third = db.invite_member(room, owner, member).unwrap();
        assert_eq!(third.status, "INVITED");
    }

    #[test]
    fn membership_grants_room_visibility() {
        let (db, owner, member, room) = setup();
        assert!(db.list_rooms(member).unwrap().is_empty());

        db.invite_member(room, owner, member).unwrap();
        assert_eq!(db.list_rooms(member).unwrap().len(), 1);
        assert_eq!(db.list_rooms(owner).unwrap()[0].id, room);
    }
}
