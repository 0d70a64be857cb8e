use anyhow::{Result, bail};

use super::AppConfig;

const MIN_JWT_SECRET_LEN: usize = 16;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.database.url.trim().is_empty() {
        errors.push("database.url must not be empty".to_string());
    }

    if cfg.database.min_idle > cfg.database.max_connections {
        errors.push(format!(
            "database.min_idle ({}) must be <= database.max_connections ({})",
            cfg.database.min_idle, cfg.database.max_connections
        ));
    }

    let auth = &cfg.auth;
    if auth.jwt_secret.trim().is_empty() {
        errors.push("auth.jwt_secret is required".to_string());
    } else if auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        errors.push(format!(
            "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} characters"
        ));
    }

    if auth.jwt_issuer.trim().is_empty() {
        errors.push("auth.jwt_issuer must not be empty".to_string());
    }

    if auth.access_token_ttl_secs == 0 {
        errors.push("auth.access_token_ttl_secs must be > 0".to_string());
    }

    if auth.refresh_token_ttl_days <= 0 {
        errors.push("auth.refresh_token_ttl_days must be > 0".to_string());
    }

    if auth.password_hash_iterations == 0 {
        errors.push("auth.password_hash_iterations must be > 0".to_string());
    }

    if auth.password_hash_parallelism == 0 {
        errors.push("auth.password_hash_parallelism must be > 0".to_string());
    }

    if cfg.cleanup.token_cleanup_interval_secs == 0 {
        errors.push("cleanup.token_cleanup_interval_secs must be > 0".to_string());
    }

    let rate_limit = &cfg.rate_limit;
    if rate_limit.enabled {
        if rate_limit.auth_window_secs == 0 || rate_limit.auth_max_requests == 0 {
            errors.push(
                "rate_limit.auth_window_secs and rate_limit.auth_max_requests must be > 0"
                    .to_string(),
            );
        }

        if rate_limit.refresh_window_secs == 0 || rate_limit.refresh_max_requests == 0 {
            errors.push(
                "rate_limit.refresh_window_secs and rate_limit.refresh_max_requests must be > 0"
                    .to_string(),
            );
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
