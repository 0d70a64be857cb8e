use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;

use crate::{
    auth::UserStatus,
    config::AppConfig,
    db::{
        connection,
        dao::{DaoContext, NewUser},
        entities::user,
    },
    routes::app,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret-with-enough-length";

/// In-memory sqlite with a single pooled connection so every query sees the
/// same database, plus cheap argon2 parameters and no rate limiting.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = "sqlite::memory:".to_string();
    cfg.database.max_connections = 1;
    cfg.database.min_idle = 1;
    cfg.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    cfg.auth.password_hash_memory_kib = 1024;
    cfg.auth.password_hash_iterations = 1;
    cfg.auth.password_hash_parallelism = 1;
    cfg.rate_limit.enabled = false;
    cfg
}

pub async fn test_db() -> DatabaseConnection {
    connection::connect(&test_config().database)
        .await
        .expect("connect test database")
}

pub async fn test_state() -> Arc<AppState> {
    test_state_with(test_config()).await
}

pub async fn test_state_with(cfg: AppConfig) -> Arc<AppState> {
    let db = connection::connect(&cfg.database)
        .await
        .expect("connect test database");
    AppState::new(cfg, db).expect("build app state")
}

pub fn test_router(state: Arc<AppState>) -> Router {
    app(state)
}

/// Inserts an active user whose password hash is not a valid argon2 string;
/// use the register flow when a login is needed.
pub async fn seed_user(db: &DatabaseConnection, username: &str, email: &str) -> user::Model {
    DaoContext::new(db)
        .user()
        .create_user(
            db,
            NewUser {
                username,
                email,
                password_hash: "not-a-real-hash",
                status: UserStatus::Active.as_str(),
            },
        )
        .await
        .expect("seed user")
}
