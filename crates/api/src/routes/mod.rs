pub mod events;
pub mod index;
pub mod users;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::header::{HeaderValue, SET_COOKIE},
    response::Response,
    Json,
};

use crate::error::AppError;

/// `Json` extractor whose rejections use the API's error body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

pub(crate) fn with_cookie(mut response: Response, cookie: String) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|_| AppError::Internal("Failed to build cookie header".to_string()))?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(response)
}
