use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a friendship request. PENDING is the only state that
/// admits a transition; accept/reject are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendshipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Room membership state. Unlike friendships, a removed or rejected
/// member can be re-invited with a fresh row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Invited,
    Accepted,
    Rejected,
    Removed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransitionError(pub String);

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invited => "INVITED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Removed => "REMOVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INVITED" => Some(Self::Invited),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            "REMOVED" => Some(Self::Removed),
            _ => None,
        }
    }

    /// An active membership blocks re-invitation; rejected/removed rows
    /// do not.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Invited | Self::Accepted)
    }

    /// Membership state machine. Checked before every status update of an
    /// existing row.
    pub fn check_transition(self, next: MemberStatus) -> Result<(), TransitionError> {
        match (self, next) {
            (Self::Accepted, Self::Rejected) => Err(TransitionError(
                "Accepted member cannot reject the invitation.".into(),
            )),
            (Self::Accepted, Self::Accepted) => Err(TransitionError("Already accepted.".into())),
            (Self::Rejected, Self::Accepted) => {
                Err(TransitionError("Rejected member cannot accept.".into()))
            }
            (Self::Removed, Self::Accepted) => {
                Err(TransitionError("Removed member cannot accept.".into()))
            }
            (from, Self::Removed) if !from.is_active() => Err(TransitionError(
                "Only accepted or invited users can be removed.".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Notification categories, as stored in the `notification_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FriendRequest,
    Message,
    General,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FriendRequest => "friend_request",
            Self::Message => "message",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "friend_request" => Some(Self::FriendRequest),
            "message" => Some(Self::Message),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Parse a timestamp column. Rows written by this codebase carry RFC 3339;
/// rows created through SQLite's `datetime('now')` default come back as
/// naive "YYYY-MM-DD HH:MM:SS" and are treated as UTC.
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_default()
}
