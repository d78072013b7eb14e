//! Row-to-response mapping between the DB layer and the API types.

use amity_db::models::{FriendshipRow, MessageRow, NotificationRow, RoomMemberRow, RoomRow, UserRef};
use amity_types::api::{
    FriendshipResponse, MessageResponse, NotificationResponse, RoomMemberResponse, RoomResponse,
    UserSummary,
};
use amity_types::models::{
    FriendshipStatus, MemberStatus, NotificationKind, parse_timestamp,
};

pub(crate) fn user_summary(user: UserRef) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }
}

pub(crate) fn friendship_response(row: FriendshipRow) -> FriendshipResponse {
    FriendshipResponse {
        id: row.id,
        status: FriendshipStatus::parse(&row.status).unwrap_or(FriendshipStatus::Pending),
        created_at: parse_timestamp(&row.created_at),
        sender: user_summary(row.sender),
        receiver: user_summary(row.receiver),
    }
}

pub(crate) fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: row.id,
        receiver_id: row.receiver_id,
        content: row.content,
        is_read: row.is_read,
        timestamp: parse_timestamp(&row.timestamp),
        sender: user_summary(row.sender),
    }
}

pub(crate) fn notification_response(row: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: row.id,
        notification_type: NotificationKind::parse(&row.notification_type)
            .unwrap_or(NotificationKind::General),
        content: row.content,
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn room_response(row: RoomRow) -> RoomResponse {
    RoomResponse {
        id: row.id,
        name: row.name,
        created_by: row.created_by,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub(crate) fn room_member_response(row: RoomMemberRow) -> RoomMemberResponse {
    RoomMemberResponse {
        id: row.id,
        room_id: row.room_id,
        status: MemberStatus::parse(&row.status).unwrap_or(MemberStatus::Invited),
        invited_on: parse_timestamp(&row.invited_on),
        accepted_on: row.accepted_on.as_deref().map(parse_timestamp),
        rejected_on: row.rejected_on.as_deref().map(parse_timestamp),
        removed_on: row.removed_on.as_deref().map(parse_timestamp),
        user: user_summary(row.user),
    }
}
