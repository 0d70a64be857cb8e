use std::collections::HashMap;

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Settings read from `APP_`-prefixed variables. `__` separates nested keys,
/// so `APP_AUTH__JWT_SECRET` fills `auth.jwt_secret`.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Reads the process environment after loading `.env` from the working
    /// directory, if one exists.
    fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            return Err(err).context("failed to load .env");
        }
        Self::load(None)
    }

    /// Same as [`EnvConfig::from_env`] but over an explicit variable map.
    fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let settings = config_rs::Config::builder()
            .add_source(
                config_rs::Environment::with_prefix(Self::PREFIX)
                    .prefix_separator("_")
                    .separator(Self::SEPARATOR)
                    .try_parsing(true)
                    .source(vars),
            )
            .build()
            .context("failed to read environment variables for config")?;

        let cfg = settings
            .try_deserialize::<Self>()
            .context("failed to deserialize environment into config")?;

        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::EnvConfig;
    use crate::config::AppConfig;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn nested_keys_override_defaults() {
        let cfg = AppConfig::from_vars(vars(&[
            ("APP_AUTH__JWT_SECRET", "an-env-provided-secret"),
            ("APP_AUTH__ACCESS_TOKEN_TTL_SECS", "60"),
            ("APP_GENERAL__PORT", "8080"),
            ("APP_RATE_LIMIT__ENABLED", "false"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.auth.jwt_secret, "an-env-provided-secret");
        assert_eq!(cfg.auth.access_token_ttl_secs, 60);
        assert_eq!(cfg.general.port, 8080);
        assert!(!cfg.rate_limit.enabled);
        assert_eq!(cfg.auth.refresh_token_ttl_days, 7);
    }

    #[test]
    fn missing_secret_fails_validation() {
        let err = AppConfig::from_vars(vars(&[("APP_GENERAL__PORT", "8080")]))
            .expect_err("secret is required");
        assert!(format!("{err:#}").contains("auth.jwt_secret is required"));
    }
}
