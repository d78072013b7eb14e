use axum::{Extension, Json, extract::Path, extract::State};

use amity_types::api::{Detail, NotificationResponse};

use crate::auth::AppState;
use crate::convert::notification_response;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;

/// The caller's notifications, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let db = state.db.clone();
    let rows = blocking(move || db.list_notifications(user.id)).await?;
    Ok(Json(rows.into_iter().map(notification_response).collect()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Detail>, ApiError> {
    let db = state.db.clone();
    blocking(move || db.mark_notification_read(id, user.id)).await?;
    Ok(Json(Detail::new("Notification marked as read.")))
}
