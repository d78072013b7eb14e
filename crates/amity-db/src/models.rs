//! Database row types. These map directly to SQLite rows and stay
//! distinct from the amity-types API models.

/// The subset of a user row embedded in joined query results.
#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

impl UserRow {
    pub fn user_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug)]
pub struct FriendshipRow {
    pub id: i64,
    pub sender: UserRef,
    pub receiver: UserRef,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: i64,
    pub sender: UserRef,
    pub receiver_id: i64,
    pub content: String,
    pub is_read: bool,
    pub timestamp: String,
}

pub struct NotificationRow {
    pub id: i64,
    pub recipient_id: i64,
    pub notification_type: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug)]
pub struct RoomRow {
    pub id: i64,
    pub name: String,
    pub created_by: i64,
    pub created_at: String,
}

#[derive(Debug)]
pub struct RoomMemberRow {
    pub id: i64,
    pub room_id: i64,
    pub user: UserRef,
    pub status: String,
    pub invited_on: String,
    pub accepted_on: Option<String>,
    pub rejected_on: Option<String>,
    pub removed_on: Option<String>,
}
