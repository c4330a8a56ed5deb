use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::Response,
};

use crate::auth::cookie::extract_token;
use crate::auth::Claims;
use crate::error::AppError;
use crate::state::AppState;

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
}

fn cookie_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_token)
}

/// JWT middleware that validates the caller's token, if any, and adds the
/// claims to the request extensions for the identity extractors.
///
/// A bad Bearer token is rejected outright. A bad session cookie is ignored so
/// an expired cookie never blocks login or logout.
pub async fn jwt_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(&request) {
        let claims = state.jwt_service().verify_token(token)?;
        request.extensions_mut().insert::<Claims>(claims);
    } else if let Some(token) = cookie_token(&request) {
        match state.jwt_service().verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert::<Claims>(claims);
            }
            Err(_) => tracing::debug!("Ignoring invalid session cookie"),
        }
    }

    Ok(next.run(request).await)
}
