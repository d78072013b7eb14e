use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use amity_db::models::UserRef;
use amity_types::api::UserSummary;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// Name of the cookie carrying the auth token, for browser clients.
pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated account, injected into request extensions by
/// `require_auth`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl AuthUser {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    pub fn user_ref(&self) -> UserRef {
        UserRef {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// The raw token the request authenticated with, kept around so logout
/// can revoke exactly this session.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

/// Pull the token from the `auth_token` cookie or, failing that, the
/// Authorization header (`Bearer` or `Token` schemes). Cookie first, so
/// browser sessions win over a stale stored header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }

    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("Token "))
        .map(str::to_string)
}

/// Validate the presented token against the tokens table and stash the
/// resolved user in request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided.".into()))?;

    let user = resolve_token(&state, &token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token.".into()))?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(AuthToken(token));
    Ok(next.run(req).await)
}

/// Token lookup shared with the WebSocket upgrade path.
pub(crate) async fn resolve_token(
    state: &AppState,
    token: &str,
) -> Result<Option<AuthUser>, ApiError> {
    let db = state.db.clone();
    let token = token.to_string();
    let row = blocking(move || db.get_user_by_token(&token)).await?;

    Ok(row.map(|u| AuthUser {
        id: u.id,
        email: u.email,
        first_name: u.first_name,
        last_name: u.last_name,
    }))
}
