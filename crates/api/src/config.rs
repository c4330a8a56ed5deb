use anyhow::{Context, Result};
use std::env;

use crate::auth::AuthConfig;

/// Process configuration, read once at startup and passed down explicitly.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub skip_migrations: bool,
}

/// Settings for the router's middleware stack.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub auth_rate_limit: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 30,
            auth_rate_limit: true,
        }
    }
}

/// Administrator account created on startup when absent.
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a valid port number")?,
            database: DatabaseConfig::from_env()?,
            http: HttpConfig::from_env(),
            auth: AuthConfig::from_env()?,
            bootstrap_admin: BootstrapAdmin::from_env(),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            skip_migrations: flag("SKIP_MIGRATIONS", false),
        })
    }
}

impl HttpConfig {
    fn from_env() -> Self {
        let defaults = Self::default();

        // FRONTEND_URL is the single-origin form of ALLOWED_ORIGINS
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .or_else(|_| env::var("FRONTEND_URL"))
            .map(|raw| split_origins(&raw))
            .unwrap_or(defaults.allowed_origins);

        Self {
            allowed_origins,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            auth_rate_limit: flag("AUTH_RATE_LIMIT", defaults.auth_rate_limit),
        }
    }
}

impl BootstrapAdmin {
    fn from_env() -> Option<Self> {
        let email = env::var("ADMIN_EMAIL").ok()?;
        let password = env::var("ADMIN_PASSWORD").ok()?;
        Some(Self {
            full_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "administrator".to_string()),
            email,
            password,
        })
    }
}

fn flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
