mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::*;
use infra::models::Role;
use serde_json::json;
use uuid::Uuid;

fn create_event_body(title: &str, capacity: i64) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Created over HTTP",
        "date": "2026-12-10",
        "time": "20:00",
        "location": "Room 4",
        "maxParticipants": capacity,
    })
}

#[tokio::test]
async fn test_create_event_requires_admin() {
    let app = setup();
    let user = create_test_user(&app, "plain user", "user@test.com", Role::User).await;
    let token = token_for(&app, &user);
    let body = create_event_body("Guarded", 5);

    let anonymous = send(&app, Method::POST, "/api/v1/event/create-event", None, Some(body.clone())).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["error"], "UNAUTHORIZED");

    let forbidden = send(&app, Method::POST, "/api/v1/event/create-event", Some(&token), Some(body)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["error"], "FORBIDDEN");
    assert!(forbidden.body["message"]
        .as_str()
        .unwrap()
        .ends_with("Your current role is USER"));
}

#[tokio::test]
async fn test_admin_creates_event() {
    let app = setup();
    let admin = create_test_user(&app, "the admin", "admin@test.com", Role::Admin).await;
    let token = token_for(&app, &admin);

    let created = send(
        &app,
        Method::POST,
        "/api/v1/event/create-event",
        Some(&token),
        Some(create_event_body("Launch Party", 2)),
    )
    .await;

    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["message"], "Event created successfully");
    let event = &created.body["event"];
    assert_eq!(event["title"], "Launch Party");
    assert_eq!(event["date"], "2026-12-10");
    assert_eq!(event["maxParticipants"], 2);
    assert_eq!(event["confirmedParticipants"], json!([]));

    let duplicate = send(
        &app,
        Method::POST,
        "/api/v1/event/create-event",
        Some(&token),
        Some(create_event_body("Launch Party", 2)),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_create_event_validation_errors() {
    let app = setup();
    let admin = create_test_user(&app, "the admin", "admin@test.com", Role::Admin).await;
    let token = token_for(&app, &admin);

    let missing = send(
        &app,
        Method::POST,
        "/api/v1/event/create-event",
        Some(&token),
        Some(json!({ "title": "Half an event" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "INVALID_INPUT");

    let zero = send(
        &app,
        Method::POST,
        "/api/v1/event/create-event",
        Some(&token),
        Some(create_event_body("Empty Room", 0)),
    )
    .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);
    assert!(zero.body["message"]
        .as_str()
        .unwrap()
        .contains("maxParticipants must be a positive number."));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/event/create-event")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let malformed = send_request(&app, request).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_participants_of_empty_event_use_placeholders() {
    let app = setup();
    let event = create_test_event(&app, "Quiet Night", 3).await;

    let response = send(
        &app,
        Method::GET,
        &format!("/api/v1/event/participants/{}", event.id),
        None,
        None,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Quiet Night");
    assert_eq!(response.body["confirmedParticipants"], "No confirmed participants");
    assert_eq!(response.body["waitlistParticipants"], "No waitlist participants");
}

#[tokio::test]
async fn test_participants_of_unknown_or_malformed_event_is_not_found() {
    let app = setup();

    let unknown = send(
        &app,
        Method::GET,
        &format!("/api/v1/event/participants/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["message"], "Event not found");

    let malformed = send(&app, Method::GET, "/api/v1/event/participants/not-an-id", None, None).await;
    assert_eq!(malformed.status, StatusCode::NOT_FOUND);
    assert_eq!(malformed.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_join_and_cancel_over_http() {
    let app = setup();
    let event = create_test_event(&app, "Small Table", 1).await;
    let alice = create_test_user(&app, "alice smith", "alice@test.com", Role::User).await;
    let bob = create_test_user(&app, "bob jones", "bob@test.com", Role::User).await;
    let alice_token = token_for(&app, &alice);
    let bob_token = token_for(&app, &bob);

    let join_uri = format!("/api/v1/event/join/{}", event.id);
    let cancel_uri = format!("/api/v1/event/cancel-participant/{}", event.id);

    let anonymous = send(&app, Method::POST, &join_uri, None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let joined = send(&app, Method::POST, &join_uri, Some(&alice_token), None).await;
    assert_eq!(joined.status, StatusCode::OK);
    assert_eq!(joined.body["status"], "confirmed");
    assert_eq!(joined.body["message"], "User added to event confirmed list");

    let waitlisted = send(&app, Method::POST, &join_uri, Some(&bob_token), None).await;
    assert_eq!(waitlisted.body["status"], "waitlisted");
    assert_eq!(waitlisted.body["message"], "User added to event waitlist");

    let again = send(&app, Method::POST, &join_uri, Some(&alice_token), None).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], "ALREADY_JOINED");

    let not_confirmed = send(&app, Method::POST, &cancel_uri, Some(&bob_token), None).await;
    assert_eq!(not_confirmed.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_confirmed.body["error"], "NOT_CONFIRMED");

    let listing = send(
        &app,
        Method::GET,
        &format!("/api/v1/event/participants/{}", event.id),
        None,
        None,
    )
    .await;
    assert_eq!(listing.body["confirmedParticipants"][0]["email"], "alice@test.com");
    assert_eq!(listing.body["waitlistParticipants"][0]["fullName"], "bob jones");

    let cancelled = send(&app, Method::POST, &cancel_uri, Some(&alice_token), None).await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["message"], "Participation cancelled and waitlist updated");
    assert_eq!(cancelled.body["promoted"], true);
    assert_eq!(cancelled.body["promotedUser"]["id"], bob.id.to_string());

    let listing = send(
        &app,
        Method::GET,
        &format!("/api/v1/event/participants/{}", event.id),
        None,
        None,
    )
    .await;
    assert_eq!(listing.body["confirmedParticipants"][0]["id"], bob.id.to_string());
    assert_eq!(listing.body["waitlistParticipants"], "No waitlist participants");
}

#[tokio::test]
async fn test_join_unknown_event_is_not_found() {
    let app = setup();
    let alice = create_test_user(&app, "alice smith", "alice@test.com", Role::User).await;
    let token = token_for(&app, &alice);

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/event/join/{}", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = setup();

    let registered = send(
        &app,
        Method::POST,
        "/api/v1/user/register",
        None,
        Some(json!({
            "fullName": "Jane Doe",
            "email": "Jane@Test.com",
            "password": "correct-horse",
        })),
    )
    .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
    assert_eq!(registered.body["data"]["email"], "jane@test.com");
    assert_eq!(registered.body["data"]["fullName"], "jane doe");
    assert_eq!(registered.body["data"]["role"], "USER");
    assert!(registered.body["data"].get("passwordHash").is_none());
    let set_cookie = registered.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));

    let duplicate = send(
        &app,
        Method::POST,
        "/api/v1/user/register",
        None,
        Some(json!({
            "fullName": "Jane Again",
            "email": "jane@test.com",
            "password": "another-password",
        })),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let wrong_password = send(
        &app,
        Method::POST,
        "/api/v1/user/login",
        None,
        Some(json!({ "email": "jane@test.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body["message"], "Invalid Credentials");

    let logged_in = send(
        &app,
        Method::POST,
        "/api/v1/user/login",
        None,
        Some(json!({ "email": "jane@test.com", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(logged_in.status, StatusCode::OK);
    let token = logged_in.body["token"].as_str().unwrap().to_string();

    // The session cookie alone authenticates
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/user/profile")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let profile = send_request(&app, request).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["data"]["email"], "jane@test.com");
    assert_eq!(profile.body["data"]["confirmedEvents"], json!([]));

    let logged_out = send(&app, Method::POST, "/api/v1/user/logout", None, None).await;
    assert_eq!(logged_out.status, StatusCode::OK);
    let cleared = logged_out.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_register_rejects_incomplete_input() {
    let app = setup();

    let response = send(
        &app,
        Method::POST,
        "/api/v1/user/register",
        None,
        Some(json!({ "email": "someone@test.com" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "All fields are required");
}

#[tokio::test]
async fn test_login_unknown_user_is_unauthorized() {
    let app = setup();

    let response = send(
        &app,
        Method::POST,
        "/api/v1/user/login",
        None,
        Some(json!({ "email": "ghost@test.com", "password": "whatever1" })),
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "User does not exist");
}

#[tokio::test]
async fn test_invalid_bearer_token_is_rejected() {
    let app = setup();

    let response = send(&app, Method::GET, "/", Some("not-a-jwt"), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_index_health_and_fallback() {
    let app = setup();

    let index = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(index.status, StatusCode::OK);
    assert!(index.body["endpoints"]["Event Routes"].is_object());

    let health = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);

    let missing = send(&app, Method::GET, "/api/v1/nowhere", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "NOT_FOUND");
}
