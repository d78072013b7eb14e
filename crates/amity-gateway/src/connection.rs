use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{error, info, warn};

use amity_db::Database;
use amity_db::models::UserRef;
use amity_types::api::UserSummary;
use amity_types::events::{InboundFrame, MessageBroadcast, OutboundFrame};
use amity_types::models::parse_timestamp;

use crate::registry::{Registry, pair_group};

/// Handle one authenticated chat connection between `user` and the peer
/// identified by `peer_id`. The token was already validated at the HTTP
/// upgrade layer.
///
/// Each inbound `{"message": …}` frame is persisted and then fanned out
/// to the whole pair group, the sender's own connection included. There
/// is no ack protocol and no offline queueing: a peer that is not
/// connected simply misses the broadcast and catches up over REST.
pub async fn handle_connection(
    socket: WebSocket,
    db: Arc<Database>,
    registry: Registry,
    user: UserSummary,
    peer_id: i64,
) {
    let group = pair_group(user.id, peer_id);
    let (conn_id, mut group_rx) = registry.join(&group).await;

    info!("{} ({}) connected to {}", user.email, user.id, group);

    let (mut sender, mut receiver) = socket.split();

    // Relay group broadcasts to this client.
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = match group_rx.recv().await {
                Ok(frame) => frame,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Chat receiver lagged by {} frames", n);
                    continue;
                }
                Err(_) => break,
            };

            let text = serde_json::to_string(&frame).unwrap();
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Persist inbound messages, then broadcast to the group.
    let registry_recv = registry.clone();
    let group_recv = group.clone();
    let user_recv = user.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<InboundFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            let preview: String = text.chars().take(200).collect();
                            warn!(
                                "{} ({}) bad frame: {} -- raw: {}",
                                user_recv.email, user_recv.id, e, preview
                            );
                            continue;
                        }
                    };

                    // DB work runs off the cooperative context.
                    let db = db.clone();
                    let sender_ref = UserRef {
                        id: user_recv.id,
                        email: user_recv.email.clone(),
                        first_name: user_recv.first_name.clone(),
                        last_name: user_recv.last_name.clone(),
                    };
                    let saved = tokio::task::spawn_blocking(move || {
                        db.create_message(&sender_ref, peer_id, &frame.message)
                    })
                    .await;

                    let row = match saved {
                        Ok(Ok(row)) => row,
                        Ok(Err(e)) => {
                            // No error frame on this path: the receive
                            // cycle just ends and the client sees a close.
                            error!("Failed to persist chat message: {}", e);
                            break;
                        }
                        Err(e) => {
                            error!("spawn_blocking join error: {}", e);
                            break;
                        }
                    };

                    let outbound = OutboundFrame {
                        message: MessageBroadcast {
                            id: row.id,
                            content: row.content,
                            sender: user_recv.clone(),
                            timestamp: parse_timestamp(&row.timestamp),
                        },
                    };
                    registry_recv.broadcast(&group_recv, outbound).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Whichever task finishes first tears the other down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    registry.leave(&group, conn_id).await;
    info!("{} ({}) disconnected from {}", user.email, user.id, group);
}
