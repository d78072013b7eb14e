use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Query, extract::State};
use serde::Deserialize;

use amity_types::api::{MessageResponse, SendMessageRequest};

use crate::auth::AppState;
use crate::convert::message_response;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub user_id: Option<i64>,
    /// Cursor: return only messages with id strictly greater than this.
    pub after_id: Option<i64>,
}

/// Append a message. There is no check that the two accounts are accepted
/// friends: any account may message any other.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let row =
        blocking(move || db.create_message(&user.user_ref(), req.receiver_id, &req.content))
            .await?;

    Ok((StatusCode::CREATED, Json(message_response(row))))
}

/// The conversation between the caller and `user_id`, ascending by
/// timestamp. Also marks messages addressed to the caller as read.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Vec<MessageResponse>>, ApiError> {
    let other_user_id = query.user_id.ok_or_else(|| {
        ApiError::Validation("user_id query parameter is required.".into())
    })?;

    let db = state.db.clone();
    let rows =
        blocking(move || db.list_conversation(user.id, other_user_id, query.after_id)).await?;

    Ok(Json(rows.into_iter().map(message_response).collect()))
}
