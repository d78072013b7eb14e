pub mod auth;
pub mod error;
pub mod friendships;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod realtime;
pub mod rooms;

mod convert;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use auth::{AppState, AppStateInner};

/// Assemble the full application router: public auth routes, the
/// token-protected API, and the chat WebSocket endpoint.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/logout", post(auth::logout))
        .route(
            "/api/friendships",
            get(friendships::list).post(friendships::send_invite),
        )
        .route("/api/friendships/friends", get(friendships::list_friends))
        .route("/api/friendships/pending", get(friendships::list_pending))
        .route("/api/friendships/{id}/accept", post(friendships::accept_invite))
        .route("/api/friendships/{id}/reject", post(friendships::reject_invite))
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
        .route("/api/rooms", get(rooms::list).post(rooms::create))
        .route("/api/rooms/{id}/invite", post(rooms::invite))
        .route("/api/rooms/{id}/accept", post(rooms::accept))
        .route("/api/rooms/{id}/reject", post(rooms::reject))
        .route("/api/rooms/{id}/remove", post(rooms::remove))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state.clone());

    let ws_route = Router::new()
        .route("/ws/chat/{user_id}", get(realtime::chat_upgrade))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
