use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Path, extract::State};

use amity_types::api::{CreateRoomRequest, RoomMemberRequest, RoomMemberResponse, RoomResponse};

use crate::auth::AppState;
use crate::convert::{room_member_response, room_response};
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let row = blocking(move || db.create_room(user.id, &req.name)).await?;
    Ok((StatusCode::CREATED, Json(room_response(row))))
}

/// Rooms the caller owns or holds an active membership in.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_rooms(user.id)).await?;
    Ok(Json(rows.into_iter().map(room_response).collect()))
}

/// Invite a user into a room (owner only).
pub async fn invite(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RoomMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let row = blocking(move || db.invite_member(room_id, user.id, req.user_id)).await?;
    Ok((StatusCode::CREATED, Json(room_member_response(row))))
}

/// Accept one's own invitation.
pub async fn accept(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RoomMemberResponse>, ApiError> {
    let db = state.db.clone();
    let row = blocking(move || db.respond_membership(room_id, user.id, true)).await?;
    Ok(Json(room_member_response(row)))
}

/// Reject one's own invitation.
pub async fn reject(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RoomMemberResponse>, ApiError> {
    let db = state.db.clone();
    let row = blocking(move || db.respond_membership(room_id, user.id, false)).await?;
    Ok(Json(room_member_response(row)))
}

/// Remove a member from a room (owner only).
pub async fn remove(
    State(state): State<AppState>,
    Path(room_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RoomMemberRequest>,
) -> Result<Json<RoomMemberResponse>, ApiError> {
    let db = state.db.clone();
    let row = blocking(move || db.remove_member(room_id, user.id, req.user_id)).await?;
    Ok(Json(room_member_response(row)))
}
