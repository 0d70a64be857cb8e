use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{PasswordPolicy, TokenSigner},
    config::AppConfig,
    middleware::{RateLimiter, rate_limit::limiter_from_config},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub signer: TokenSigner,
    pub passwords: PasswordPolicy,
    pub auth_limiter: Arc<dyn RateLimiter>,
    pub refresh_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Fails when the password hashing parameters are unusable.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Arc<Self>> {
        let signer = TokenSigner::from_config(&config.auth);
        let passwords = PasswordPolicy::from_config(&config.auth)?;
        let limits = &config.rate_limit;
        let auth_limiter =
            limiter_from_config(limits, limits.auth_window_secs, limits.auth_max_requests);
        let refresh_limiter = limiter_from_config(
            limits,
            limits.refresh_window_secs,
            limits.refresh_max_requests,
        );

        Ok(Arc::new(Self {
            config,
            db,
            signer,
            passwords,
            auth_limiter,
            refresh_limiter,
        }))
    }
}
