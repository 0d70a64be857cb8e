pub mod auth_service;
pub mod context;
pub mod token_cleanup;
pub mod token_store;
pub mod user_service;

pub use auth_service::{AuthService, LoginInput, RegisterInput};
pub use context::ServiceContext;
pub use token_cleanup::spawn_token_cleanup;
pub use token_store::TokenStore;
pub use user_service::UserService;
