use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FriendshipStatus, MemberStatus, NotificationKind};

// -- Users --

/// Public view of an account, embedded wherever a user is referenced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub email: String,
}

// -- Friendships --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendInviteRequest {
    pub receiver_email: String,
}

#[derive(Debug, Serialize)]
pub struct FriendshipResponse {
    pub id: i64,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub sender: UserSummary,
    pub receiver_id: i64,
    pub content: String,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub notification_type: NotificationKind,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// -- Rooms --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRoomRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: i64,
    pub name: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoomMemberRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct RoomMemberResponse {
    pub id: i64,
    pub room_id: i64,
    pub user: UserSummary,
    pub status: MemberStatus,
    pub invited_on: DateTime<Utc>,
    pub accepted_on: Option<DateTime<Utc>>,
    pub rejected_on: Option<DateTime<Utc>>,
    pub removed_on: Option<DateTime<Utc>>,
}

/// Generic `{"detail": …}` body used for acknowledgements and errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { detail: msg.into() }
    }
}
