use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::{config::AuthConfig, error::AppError};

const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

/// Argon2id parameters used for new password hashes.
#[derive(Clone, Debug)]
pub struct PasswordPolicy {
    params: Params,
    dummy_hash: Arc<str>,
}

impl PasswordPolicy {
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        let params = Params::new(
            cfg.password_hash_memory_kib,
            cfg.password_hash_iterations,
            cfg.password_hash_parallelism,
            None,
        )
        .map_err(|err| anyhow!("invalid password hashing parameters: {err}"))?;
        let mut policy = Self {
            params,
            dummy_hash: Arc::from(""),
        };
        let dummy_hash = policy
            .hash_blocking(DUMMY_PASSWORD)
            .map_err(|err| anyhow!("failed to precompute dummy password hash: {err}"))?;
        policy.dummy_hash = Arc::from(dummy_hash);
        Ok(policy)
    }

    /// A hash under the current parameters that matches no real account.
    /// Verifying against it costs the same as verifying a stored hash.
    pub fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash_blocking(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut thread_rng());
        let hash = self
            .hasher()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AppError::internal(format!("Password hashing failed: {err}")))?
            .to_string();
        Ok(hash)
    }

    /// Hashes on the blocking pool so request workers stay free.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let policy = self.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || policy.hash_blocking(&password))
            .await
            .map_err(|err| AppError::internal(format!("Password hashing task failed: {err}")))?
    }
}

pub fn verify_password_blocking(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AppError::internal(format!("Invalid password hash: {err}")))?;

    // Parameters come from the stored hash, not the current policy.
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password_blocking(&password, &hash))
        .await
        .map_err(|err| AppError::internal(format!("Password verification task failed: {err}")))?
}
