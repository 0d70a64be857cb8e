use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cleanup: CleanupConfig,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_idle: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_DATABASE_URL.to_string(),
            max_connections: defaults::DEFAULT_DB_MAX_CONNECTIONS as u32,
            min_idle: defaults::DEFAULT_DB_MIN_IDLE as u32,
        }
    }
}

/// Token signing and password hashing settings.
///
/// `jwt_secret` has no usable default: an empty secret fails validation and
/// the server refuses to start.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_days: i64,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
    pub password_hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: defaults::DEFAULT_JWT_ISSUER.to_string(),
            access_token_ttl_secs: defaults::DEFAULT_ACCESS_TOKEN_TTL_SECS as u64,
            refresh_token_ttl_days: defaults::DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            password_hash_memory_kib: defaults::DEFAULT_PASSWORD_HASH_MEMORY_KIB as u32,
            password_hash_iterations: defaults::DEFAULT_PASSWORD_HASH_ITERATIONS as u32,
            password_hash_parallelism: defaults::DEFAULT_PASSWORD_HASH_PARALLELISM as u32,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanupConfig {
    pub token_cleanup_interval_secs: u64,
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.token_cleanup_interval_secs)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            token_cleanup_interval_secs: defaults::DEFAULT_TOKEN_CLEANUP_INTERVAL_SECS as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth_window_secs: u64,
    pub auth_max_requests: u32,
    pub refresh_window_secs: u64,
    pub refresh_max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_RATE_LIMIT_ENABLED,
            auth_window_secs: defaults::DEFAULT_AUTH_WINDOW_SECS as u64,
            auth_max_requests: defaults::DEFAULT_AUTH_MAX_REQUESTS as u32,
            refresh_window_secs: defaults::DEFAULT_REFRESH_WINDOW_SECS as u64,
            refresh_max_requests: defaults::DEFAULT_REFRESH_MAX_REQUESTS as u32,
        }
    }
}
