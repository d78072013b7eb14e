use std::sync::Arc;

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json, extract::State};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

use amity_db::Database;
use amity_gateway::registry::Registry;
use amity_types::api::{Detail, LoginRequest, LoginResponse, SignupRequest, SignupResponse};

use crate::convert::user_summary;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthToken;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub registry: Registry,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::Validation("Enter a valid email address.".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters.".into(),
        ));
    }

    // Hash with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string();

    let db = state.db.clone();
    let user = blocking(move || {
        let user = db.create_user(&req.email, &password_hash, &req.first_name, &req.last_name)?;
        Ok(user)
    })
    .await?;

    let token = issue_token(&state, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user: user_summary(user.user_ref()),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let db = state.db.clone();
    let email = req.email.clone();
    let user = blocking(move || db.get_user_by_email(&email))
        .await?
        .ok_or_else(invalid_credentials)?;

    // Same error for unknown email and bad password, no enumeration leak.
    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::Internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid_credentials())?;

    let token = issue_token(&state, user.id).await?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        email: user.email,
    }))
}

/// Delete the presented token server-side, invalidating this session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<AuthToken>,
) -> Result<Json<Detail>, ApiError> {
    let db = state.db.clone();
    blocking(move || db.delete_token(&token.0)).await?;
    Ok(Json(Detail::new("Successfully logged out.")))
}

/// Mint an opaque session token and persist it. 32 random bytes,
/// base64url; the value itself carries no claims.
async fn issue_token(state: &AppState, user_id: i64) -> Result<String, ApiError> {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    let db = state.db.clone();
    let stored = token.clone();
    blocking(move || db.create_token(user_id, &stored)).await?;
    Ok(token)
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Unable to log in with provided credentials.".into())
}
