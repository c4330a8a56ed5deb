use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{
        header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::error::AppError;
use crate::middleware::jwt::jwt_middleware;
use crate::routes::{events, index, users};
use crate::state::AppState;

/// Build the Axum router: the `/api/v1` surface plus index, health and a JSON 404.
pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    let api = Router::new()
        .merge(credential_routes(http))
        .route("/user/logout", post(users::logout))
        .route("/user/profile", post(users::profile))
        .route("/event/create-event", post(events::create_event))
        .route("/event/participants/{event_id}", get(events::participants))
        .route("/event/join/{event_id}", post(events::join))
        .route(
            "/event/cancel-participant/{event_id}",
            post(events::cancel_participation),
        );

    Router::new()
        .route("/", get(index::api_index))
        // Liveness check; also proves store connectivity.
        .route("/health", get(health))
        .nest("/api/v1", api)
        .fallback(index::not_found)
        .with_state(state.clone())
        // JWT middleware for authentication
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(http.request_timeout_secs),
        ))
        .layer(cors_layer(&http.allowed_origins))
}

/// Register and login, rate limited per client IP when enabled.
fn credential_routes(http: &HttpConfig) -> Router<AppState> {
    let routes = Router::new()
        .route("/user/register", post(users::register))
        .route("/user/login", post(users::login));

    if !http.auth_rate_limit {
        return routes;
    }

    // 1 token every 6 seconds with a burst of 10, about 10 attempts per minute
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .finish();

    match governor_conf {
        Some(conf) => routes.layer(GovernorLayer::new(Arc::new(conf))),
        None => {
            tracing::warn!("Invalid rate limit configuration, auth routes are not rate limited");
            routes
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.store.ping().await?;
    Ok("ok")
}
