use std::sync::Arc;

use infra::models::{Role, UserRow};
use infra::repos::CreateUserData;
use infra::{Store, StoreError};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{JwtService, PasswordService};
use crate::error::AppError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Validate)]
struct NewAccount {
    #[validate(length(min = 5, max = 50, message = "Name must be between 5 and 50 characters"))]
    full_name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    email: String,
    password: String,
}

/// A user together with a freshly issued access token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserRow,
    pub token: String,
}

fn required(value: Option<String>) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("All fields are required".to_string()))
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    jwt_service: JwtService,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, jwt_service: JwtService) -> Self {
        Self { store, jwt_service }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<Session, AppError> {
        let user = self.create_account(input, Role::User).await?;
        let token = self.jwt_service.create_token(&user)?;
        Ok(Session { user, token })
    }

    /// Create the configured administrator unless an account with that email
    /// already exists. Returns the existing or new user.
    pub async fn ensure_admin(&self, input: RegisterInput) -> Result<UserRow, AppError> {
        if let Some(email) = input.email.as_deref() {
            if let Some(existing) = self.store.get_user_by_email(email.trim()).await? {
                if existing.role != Role::Admin {
                    tracing::warn!(user_id = %existing.id, "Bootstrap admin email belongs to a non-admin account");
                }
                return Ok(existing);
            }
        }
        self.create_account(input, Role::Admin).await
    }

    async fn create_account(&self, input: RegisterInput, role: Role) -> Result<UserRow, AppError> {
        let full_name = required(input.full_name)?;
        let email = required(input.email)?;
        let password = required(input.password)?;

        let account = NewAccount {
            full_name: full_name.trim().to_lowercase(),
            email: email.trim().to_lowercase(),
            password,
        };
        account
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        PasswordService::validate_password_strength(&account.password)?;

        if self.store.get_user_by_email(&account.email).await?.is_some() {
            return Err(AppError::DuplicateAccount(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_password(&account.password)?;
        let user = self
            .store
            .insert_user(CreateUserData {
                full_name: account.full_name,
                email: account.email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => {
                    AppError::DuplicateAccount("User with this email already exists".to_string())
                }
                other => AppError::Persistence(other),
            })?;

        info!(user_id = %user.id, role = role.as_str(), "User registered");
        Ok(user)
    }

    pub async fn login(&self, input: LoginInput) -> Result<Session, AppError> {
        let email = required(input.email)?;
        let password = required(input.password)?;

        let user = self
            .store
            .get_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized("User does not exist".to_string()))?;

        if !PasswordService::verify_password(&password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid Credentials".to_string()));
        }

        let token = self.jwt_service.create_token(&user)?;
        Ok(Session { user, token })
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserRow, AppError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
