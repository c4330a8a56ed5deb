//! Request identity extractors.
//!
//! The JWT middleware places verified [`Claims`] into request extensions;
//! these extractors turn their presence (and role) into an authorization
//! decision for a handler.

use axum::{extract::FromRequestParts, http::request::Parts};
use infra::models::Role;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl TryFrom<&Claims> for CurrentUser {
    type Error = AppError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            id: claims.user_id()?,
            email: claims.email.clone(),
            full_name: claims.full_name.clone(),
            role: claims.role(),
        })
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::Unauthorized("You must be logged in to perform this action".to_string())
        })?;

        CurrentUser::try_from(claims)
    }
}

/// An authenticated caller holding the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            return Err(AppError::Forbidden(format!(
                "Access denied: Administrator privileges required. Your current role is {}",
                user.role.as_str()
            )));
        }

        Ok(AdminUser(user))
    }
}
