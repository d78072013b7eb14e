//! End-to-end tests for the REST surface, driven through the real router
//! against an in-memory database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use amity_api::{AppState, AppStateInner};
use amity_gateway::registry::Registry;

fn spawn_app() -> Router {
    let state: AppState = Arc::new(AppStateInner {
        db: Arc::new(amity_db::Database::open_in_memory().expect("in-memory db")),
        registry: Registry::new(),
    });
    amity_api::router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// Sign a user up and return (user_id, token).
async fn signup(app: &Router, email: &str, first_name: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        post_json(
            "/api/signup",
            None,
            json!({
                "email": email,
                "password": "password123",
                "first_name": first_name,
                "last_name": "Test",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn signup_login_logout_roundtrip() {
    let app = spawn_app();

    let (_, token) = signup(&app, "User_A@Example.com", "User").await;

    // Email was case-normalized on the way in.
    let (status, body) = send(
        &app,
        post_json(
            "/api/login",
            None,
            json!({"email": "user_a@example.com", "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "user_a@example.com");
    assert!(body["token"].is_string());

    // Duplicate signup conflicts.
    let (status, _) = send(
        &app,
        post_json(
            "/api/signup",
            None,
            json!({"email": "user_a@example.com", "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Wrong password is a 401 with no enumeration hint.
    let (status, _) = send(
        &app,
        post_json(
            "/api/login",
            None,
            json!({"email": "user_a@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logout revokes the token server-side.
    let (status, _) = send(&app, post_json("/api/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_auth("/api/notifications", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app();

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/api/friendships")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_auth("/api/friendships", "bogus-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_works_from_the_auth_cookie() {
    let app = spawn_app();
    let (_, token) = signup(&app, "cookie@example.com", "Cookie").await;

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/api/notifications")
            .header(header::COOKIE, format!("auth_token={token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn friendship_flow_with_notifications() {
    let app = spawn_app();
    let (a_id, token_a) = signup(&app, "user_a@example.com", "UserA").await;
    let (b_id, token_b) = signup(&app, "user_b@example.com", "UserB").await;

    // A invites B.
    let (status, body) = send(
        &app,
        post_json(
            "/api/friendships",
            Some(&token_a),
            json!({"receiver_email": "user_b@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["sender"]["id"], a_id);
    assert_eq!(body["receiver"]["id"], b_id);
    let friendship_id = body["id"].as_i64().unwrap();

    // Inviting yourself or re-inviting in either direction fails.
    let (status, _) = send(
        &app,
        post_json(
            "/api/friendships",
            Some(&token_a),
            json!({"receiver_email": "user_a@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/api/friendships",
            Some(&token_b),
            json!({"receiver_email": "user_a@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // B sees the request pending; A does not.
    let (_, pending) = send(&app, get_auth("/api/friendships/pending", &token_b)).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    let (_, pending) = send(&app, get_auth("/api/friendships/pending", &token_a)).await;
    assert_eq!(pending.as_array().unwrap().len(), 0);

    // Exactly one friend-request notification for B.
    let (_, notifs) = send(&app, get_auth("/api/notifications", &token_b)).await;
    let notifs = notifs.as_array().unwrap();
    assert_eq!(notifs.len(), 1);
    assert_eq!(notifs[0]["notification_type"], "friend_request");
    assert!(
        notifs[0]["content"]
            .as_str()
            .unwrap()
            .contains("sent you a friend request")
    );

    // The sender cannot accept their own request.
    let uri = format!("/api/friendships/{friendship_id}/accept");
    let (status, _) = send(&app, post_json(&uri, Some(&token_a), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // B accepts; both sides now list each other as friends.
    let (status, _) = send(&app, post_json(&uri, Some(&token_b), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, friends) = send(&app, get_auth("/api/friendships/friends", &token_a)).await;
    assert_eq!(friends[0]["id"], b_id);
    let (_, friends) = send(&app, get_auth("/api/friendships/friends", &token_b)).await;
    assert_eq!(friends[0]["id"], a_id);

    // Exactly one acceptance notification for A, even after a retry.
    let (status, _) = send(&app, post_json(&uri, Some(&token_b), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, notifs) = send(&app, get_auth("/api/notifications", &token_a)).await;
    let notifs = notifs.as_array().unwrap();
    assert_eq!(notifs.len(), 1);
    assert!(notifs[0]["content"].as_str().unwrap().contains("accepted"));
}

#[tokio::test]
async fn chat_flow_between_two_users() {
    let app = spawn_app();
    let (a_id, token_a) = signup(&app, "user_a@example.com", "UserA").await;
    let (b_id, token_b) = signup(&app, "user_b@example.com", "UserB").await;

    // A sends a message to B.
    let (status, body) = send(
        &app,
        post_json(
            "/api/messages",
            Some(&token_a),
            json!({"receiver_id": b_id, "content": "Hello User B"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "Hello User B");

    // B retrieves the conversation.
    let (status, body) = send(
        &app,
        get_auth(&format!("/api/messages?user_id={a_id}"), &token_b),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "Hello User B");
    assert_eq!(messages[0]["sender"]["id"], a_id);

    // B replies; A sees both in chronological order.
    send(
        &app,
        post_json(
            "/api/messages",
            Some(&token_b),
            json!({"receiver_id": a_id, "content": "Hi User A, nice to meet you"}),
        ),
    )
    .await;

    let (_, body) = send(
        &app,
        get_auth(&format!("/api/messages?user_id={b_id}"), &token_a),
    )
    .await;
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["content"], "Hi User A, nice to meet you");
    assert_eq!(messages[1]["sender"]["id"], b_id);
    assert!(messages[0]["timestamp"].as_str() <= messages[1]["timestamp"].as_str());

    // Missing user_id is a validation error.
    let (status, _) = send(&app, get_auth("/api/messages", &token_a)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn message_listing_honors_the_after_id_cursor() {
    let app = spawn_app();
    let (a_id, token_a) = signup(&app, "user_a@example.com", "UserA").await;
    let (b_id, token_b) = signup(&app, "user_b@example.com", "UserB").await;

    let mut ids = Vec::new();
    for n in 1..=3 {
        let (_, body) = send(
            &app,
            post_json(
                "/api/messages",
                Some(&token_a),
                json!({"receiver_id": b_id, "content": format!("Msg {n}")}),
            ),
        )
        .await;
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, body) = send(
        &app,
        get_auth(
            &format!("/api/messages?user_id={a_id}&after_id={}", ids[1]),
            &token_b,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["content"], "Msg 3");
}

#[tokio::test]
async fn notification_mark_read_is_scoped() {
    let app = spawn_app();
    let (_, token_a) = signup(&app, "user_a@example.com", "UserA").await;
    let (_, token_b) = signup(&app, "user_b@example.com", "UserB").await;

    // A invite gives B one notification.
    send(
        &app,
        post_json(
            "/api/friendships",
            Some(&token_a),
            json!({"receiver_email": "user_b@example.com"}),
        ),
    )
    .await;

    let (_, notifs) = send(&app, get_auth("/api/notifications", &token_b)).await;
    let id = notifs[0]["id"].as_i64().unwrap();
    assert_eq!(notifs[0]["is_read"], false);

    // A cannot mark B's notification.
    let uri = format!("/api/notifications/{id}/read");
    let (status, _) = send(&app, post_json(&uri, Some(&token_a), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json(&uri, Some(&token_b), json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, notifs) = send(&app, get_auth("/api/notifications", &token_b)).await;
    assert_eq!(notifs[0]["is_read"], true);
}

#[tokio::test]
async fn room_membership_over_rest() {
    let app = spawn_app();
    let (_, token_owner) = signup(&app, "owner@example.com", "Owner").await;
    let (member_id, token_member) = signup(&app, "member@example.com", "Member").await;

    let (status, room) = send(
        &app,
        post_json("/api/rooms", Some(&token_owner), json!({"name": "TestRoom"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let room_id = room["id"].as_i64().unwrap();

    // Owner-held name uniqueness.
    let (status, _) = send(
        &app,
        post_json("/api/rooms", Some(&token_owner), json!({"name": "TestRoom"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Only the owner can invite.
    let invite_uri = format!("/api/rooms/{room_id}/invite");
    let (status, _) = send(
        &app,
        post_json(&invite_uri, Some(&token_member), json!({"user_id": member_id})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, membership) = send(
        &app,
        post_json(&invite_uri, Some(&token_owner), json!({"user_id": member_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(membership["status"], "INVITED");

    // Member accepts; the accepted_on timestamp is the only one set.
    let (status, membership) = send(
        &app,
        post_json(
            &format!("/api/rooms/{room_id}/accept"),
            Some(&token_member),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["status"], "ACCEPTED");
    assert!(membership["accepted_on"].is_string());
    assert!(membership["rejected_on"].is_null());

    // Accepted member cannot reject.
    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/rooms/{room_id}/reject"),
            Some(&token_member),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Owner removes, then may re-invite.
    let (status, membership) = send(
        &app,
        post_json(
            &format!("/api/rooms/{room_id}/remove"),
            Some(&token_owner),
            json!({"user_id": member_id}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(membership["status"], "REMOVED");

    let (status, membership) = send(
        &app,
        post_json(&invite_uri, Some(&token_owner), json!({"user_id": member_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(membership["status"], "INVITED");
}
