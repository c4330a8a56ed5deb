pub mod config;
pub mod cookie;
pub mod identity;
pub mod jwt;
pub mod password;

pub use config::AuthConfig;
pub use identity::{AdminUser, CurrentUser};
pub use jwt::{Claims, JwtService};
pub use password::PasswordService;
