use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::UserSummary;

/// Frame sent by a client over the chat socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InboundFrame {
    pub message: String,
}

/// Frame fanned out to every connection in a pair group, the sender's own
/// connection included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub message: MessageBroadcast,
}

/// The persisted message as broadcast: server-assigned id and timestamp
/// plus the sender's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBroadcast {
    pub id: i64,
    pub content: String,
    pub sender: UserSummary,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_frame_is_a_single_message_field() {
        let frame: InboundFrame = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(frame.message, "hi");

        // Unknown fields are rejected rather than silently dropped.
        assert!(serde_json::from_str::<InboundFrame>(r#"{"msg": "hi"}"#).is_err());
    }

    #[test]
    fn outbound_frame_envelope_shape() {
        let frame = OutboundFrame {
            message: MessageBroadcast {
                id: 7,
                content: "Hello".into(),
                sender: UserSummary {
                    id: 1,
                    email: "a@example.com".into(),
                    first_name: "User".into(),
                    last_name: "A".into(),
                },
                timestamp: "2026-02-01T10:30:00Z".parse().unwrap(),
            },
        };

        let json: serde_json::Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["message"]["id"], 7);
        assert_eq!(json["message"]["sender"]["email"], "a@example.com");
        assert!(json["message"]["timestamp"].is_string());
    }
}
