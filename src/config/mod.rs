pub mod configs;
pub mod defaults;
pub mod envconfig;
pub mod validate;

pub use configs::{
    AppConfig, AuthConfig, CleanupConfig, DatabaseConfig, GeneralConfig, LoggingConfig,
    RateLimitConfig,
};
pub use envconfig::EnvConfig;
