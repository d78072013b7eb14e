use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json, extract::Path, extract::State};

use amity_types::api::{Detail, FriendshipResponse, SendInviteRequest, UserSummary};

use crate::auth::AppState;
use crate::convert::{friendship_response, user_summary};
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

/// All friendships the caller is a party to, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FriendshipResponse>>, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_friendships(user.id)).await?;
    Ok(Json(rows.into_iter().map(friendship_response).collect()))
}

/// Send a friend request, addressed by email.
pub async fn send_invite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SendInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let row = blocking(move || {
        let receiver = db
            .get_user_by_email(&req.receiver_email)?
            .ok_or_else(|| {
                amity_db::StoreError::NotFound("User with this email does not exist.".into())
            })?
            .user_ref();
        db.create_friendship(&user.user_ref(), &receiver)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(friendship_response(row))))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    let db = state.db.clone();
    blocking(move || db.respond_friendship(id, user.id, true)).await?;
    Ok(Json(Detail::new("Friend request accepted.")))
}

pub async fn reject_invite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    let db = state.db.clone();
    blocking(move || db.respond_friendship(id, user.id, false)).await?;
    Ok(Json(Detail::new("Friend request rejected.")))
}

/// The caller's accepted friends.
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_friends(user.id)).await?;
    Ok(Json(rows.into_iter().map(user_summary).collect()))
}

/// Requests received by the caller that are still pending.
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FriendshipResponse>>, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_pending_requests(user.id)).await?;
    Ok(Json(rows.into_iter().map(friendship_response).collect()))
}
