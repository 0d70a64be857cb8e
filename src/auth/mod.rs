mod client;
pub mod jwt;
pub mod password;
pub mod tokens;
mod types;

pub use client::{ClientInfo, client_ip};
pub use jwt::{JwtKeys, TokenError, TokenSigner};
pub use password::{PasswordPolicy, verify_password};
pub use types::{AccessPayload, AuthSession, AuthUser, Claims, UserStatus};
