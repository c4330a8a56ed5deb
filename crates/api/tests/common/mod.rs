#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use api::app::build_router;
use api::auth::AuthConfig;
use api::config::HttpConfig;
use api::services::enrollment::CreateEventInput;
use api::AppState;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use infra::models::{EventRow, Role, UserRow};
use infra::repos::CreateUserData;
use infra::{MemoryStore, PgStore, Store};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    pub router: Router,
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        access_token_expiration_minutes: 60,
        cookie_domain: None,
        cookie_secure: false,
    }
}

/// App wired to an in-memory store, with auth rate limiting off so tests
/// don't need peer addresses.
pub fn setup() -> TestApp {
    let store = MemoryStore::new();
    let state = AppState::new(Arc::new(store.clone()), test_auth_config());
    let http = HttpConfig {
        auth_rate_limit: false,
        ..HttpConfig::default()
    };
    let router = build_router(state.clone(), &http);

    TestApp {
        store,
        state,
        router,
    }
}

/// App state backed by the Postgres database at `TEST_DATABASE_URL`, with
/// migrations applied. `None` when the variable is unset.
pub async fn setup_test_db() -> Option<PgTestApp> {
    let database_url = env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let store = PgStore::new(pool);
    let state = AppState::new(Arc::new(store.clone()), test_auth_config());
    Some(PgTestApp { store, state })
}

pub struct PgTestApp {
    pub store: PgStore,
    pub state: AppState,
}

/// Rows in the shared test database outlive a run, so keys get a random suffix.
pub fn unique(label: &str) -> String {
    format!("{label}-{}", Uuid::new_v4().simple())
}

/// Insert a user directly, skipping password hashing.
pub async fn create_test_user(app: &TestApp, full_name: &str, email: &str, role: Role) -> UserRow {
    create_user_in(&app.store, full_name, email, role).await
}

pub async fn create_user_in(
    store: &dyn Store,
    full_name: &str,
    email: &str,
    role: Role,
) -> UserRow {
    store
        .insert_user(CreateUserData {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash: "$2b$10$not.a.real.hash".to_string(),
            role,
        })
        .await
        .expect("Failed to create test user")
}

pub fn token_for(app: &TestApp, user: &UserRow) -> String {
    app.state
        .jwt_service()
        .create_token(user)
        .expect("Failed to issue test token")
}

pub fn event_input(title: &str, capacity: i64) -> CreateEventInput {
    CreateEventInput {
        title: Some(title.to_string()),
        description: Some("An event created by the test suite".to_string()),
        date: Some("2026-12-01".to_string()),
        time: Some("19:00".to_string()),
        location: Some("Main Hall".to_string()),
        max_participants: Some(json!(capacity)),
    }
}

pub async fn create_test_event(app: &TestApp, title: &str, capacity: i64) -> EventRow {
    app.state
        .enrollment()
        .create_event(event_input(title, capacity))
        .await
        .expect("Failed to create test event")
}

/// Two capacity-1 events where `first` is confirmed on `events.0` and waiting
/// on `events.1`, and `second` the other way round.
pub struct CrossedEnrollment {
    pub events: (EventRow, EventRow),
    pub first: UserRow,
    pub second: UserRow,
}

pub async fn cross_enroll(state: &AppState, store: &dyn Store) -> CrossedEnrollment {
    let enrollment = state.enrollment();
    let one = enrollment
        .create_event(event_input(&unique("crossed one"), 1))
        .await
        .expect("Failed to create event");
    let two = enrollment
        .create_event(event_input(&unique("crossed two"), 1))
        .await
        .expect("Failed to create event");

    let first = create_user_in(
        store,
        "first crosser",
        &format!("{}@test.com", unique("first")),
        Role::User,
    )
    .await;
    let second = create_user_in(
        store,
        "second crosser",
        &format!("{}@test.com", unique("second")),
        Role::User,
    )
    .await;

    for (event, user) in [(&one, &first), (&two, &second), (&one, &second), (&two, &first)] {
        enrollment
            .join(event.id, user.id)
            .await
            .expect("Failed to join test event");
    }

    CrossedEnrollment {
        events: (one, two),
        first,
        second,
    }
}

pub async fn fetch_event(app: &TestApp, event: &EventRow) -> EventRow {
    app.store
        .get_event(event.id)
        .await
        .expect("Store read failed")
        .expect("Event should exist")
}

pub async fn fetch_user(app: &TestApp, user: &UserRow) -> UserRow {
    app.store
        .get_user(user.id)
        .await
        .expect("Store read failed")
        .expect("User should exist")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request through the router and decode the JSON body
/// (`Value::Null` for an empty or non-JSON body).
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    send_request(app, request).await
}

pub async fn send_request(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("Router should not fail");

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}
