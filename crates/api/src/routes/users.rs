use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use infra::models::UserRow;
use serde::Serialize;

use super::{with_cookie, ApiJson};
use crate::auth::cookie::{build_clear_cookie, build_token_cookie};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::services::accounts::{LoginInput, RegisterInput, Session};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: &'static str,
    pub data: UserRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

fn session_response(
    state: &AppState,
    status: StatusCode,
    message: &'static str,
    session: Session,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config();
    let cookie = build_token_cookie(
        &session.token,
        auth_config.cookie_max_age_secs(),
        &auth_config.cookie_domain,
        auth_config.cookie_secure,
    );

    let body = UserResponse {
        success: true,
        message,
        data: session.user,
        token: Some(session.token),
    };

    with_cookie((status, Json(body)).into_response(), cookie)
}

/// POST /user/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<Response, AppError> {
    let session = state.accounts().register(input).await?;
    session_response(
        &state,
        StatusCode::CREATED,
        "User created successfully",
        session,
    )
}

/// POST /user/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Response, AppError> {
    let session = state.accounts().login(input).await?;
    session_response(&state, StatusCode::OK, "User logged in successfully", session)
}

/// POST /user/logout
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    let auth_config = state.auth_config();
    let cookie = build_clear_cookie(&auth_config.cookie_domain, auth_config.cookie_secure);

    let body = MessageResponse {
        success: true,
        message: "User logged out successfully",
    };
    with_cookie(Json(body).into_response(), cookie)
}

/// POST /user/profile
pub async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let row = state.accounts().profile(user.id).await?;

    Ok(Json(UserResponse {
        success: true,
        message: "User profile fetched",
        data: row,
        token: None,
    }))
}
