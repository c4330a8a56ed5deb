use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use infra::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::services::enrollment::EnrollmentError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// Duplicate event; reported as 400 like every other event validation failure.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    DuplicateAccount(String),

    #[error("User has already joined the event")]
    AlreadyJoined,

    #[error("User not in confirmed participants list")]
    NotConfirmed,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("persistence failure")]
    Persistence(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Conflict(_) | AppError::DuplicateAccount(_) => "CONFLICT",
            AppError::AlreadyJoined => "ALREADY_JOINED",
            AppError::NotConfirmed => "NOT_CONFIRMED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Persistence(_) => "PERSISTENCE_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_)
            | AppError::Conflict(_)
            | AppError::AlreadyJoined
            | AppError::NotConfirmed => StatusCode::BAD_REQUEST,
            AppError::DuplicateAccount(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<EnrollmentError> for AppError {
    fn from(e: EnrollmentError) -> Self {
        match e {
            EnrollmentError::EventNotFound => AppError::NotFound("Event not found".to_string()),
            EnrollmentError::UserNotFound => AppError::NotFound("User not found".to_string()),
            EnrollmentError::AlreadyJoined => AppError::AlreadyJoined,
            EnrollmentError::NotConfirmed => AppError::NotConfirmed,
            EnrollmentError::InvalidInput(msg) => AppError::InvalidInput(msg),
            EnrollmentError::Conflict => AppError::Conflict(
                "An event with the same title, date, and location already exists.".to_string(),
            ),
            EnrollmentError::Persistence(e) => AppError::Persistence(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Persistence(e) => {
                // Log the real error server-side; return a generic message to clients
                tracing::error!("Store error: {e}");
                "Internal persistence error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                error: self.kind(),
                message,
            }),
        )
            .into_response()
    }
}
