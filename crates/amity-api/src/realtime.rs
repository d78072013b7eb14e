use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use amity_gateway::connection;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::{extract_token, resolve_token};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Browser WebSocket clients cannot set headers, so the token may
    /// also come in as a query parameter.
    pub token: Option<String>,
}

/// Upgrade to the chat socket for the pair (caller, `user_id`).
/// Unauthenticated attempts are rejected before the socket opens.
pub async fn chat_upgrade(
    State(state): State<AppState>,
    Path(peer_id): Path<i64>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_token(&headers)
        .or(query.token)
        .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided.".into()))?;

    let user = resolve_token(&state, &token).await?.ok_or_else(|| {
        warn!("WebSocket upgrade with invalid token");
        ApiError::Unauthorized("Invalid token.".into())
    })?;

    // An unknown peer would only fault at persist time otherwise.
    let db = state.db.clone();
    blocking(move || db.get_user_by_id(peer_id)).await?.ok_or_else(|| {
        ApiError::NotFound("User not found.".into())
    })?;

    Ok(ws.on_upgrade(move |socket| {
        connection::handle_connection(
            socket,
            state.db.clone(),
            state.registry.clone(),
            user.summary(),
            peer_id,
        )
    }))
}
