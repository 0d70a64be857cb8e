use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;
use uuid::Uuid;

use super::{AccessPayload, Claims};
use crate::{config::AuthConfig, error::AppError, validation::is_valid_email};

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token payload has the wrong shape")]
    MalformedPayload,
    #[error("invalid token: {0}")]
    Invalid(String),
}

pub fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Signs and verifies HS256 access tokens for one issuer.
#[derive(Clone)]
pub struct TokenSigner {
    keys: JwtKeys,
    issuer: String,
    ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            keys: JwtKeys::from_secret(secret),
            issuer: issuer.into(),
            ttl_secs,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            cfg.jwt_secret.as_bytes(),
            cfg.jwt_issuer.clone(),
            cfg.access_token_ttl_secs,
        )
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn sign(&self, payload: &AccessPayload) -> Result<String, AppError> {
        self.sign_at(payload, now_unix())
    }

    pub fn sign_at(&self, payload: &AccessPayload, issued_at: u64) -> Result<String, AppError> {
        let claims = Claims {
            user_id: payload.user_id.to_string(),
            username: payload.username.clone(),
            email: payload.email.clone(),
            iss: self.issuer.clone(),
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, &claims, &self.keys.enc)
            .map_err(|err| AppError::internal(format!("Token encoding failed: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<AccessPayload, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.keys.dec, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::Json(_) => TokenError::MalformedPayload,
                _ => TokenError::Invalid(err.to_string()),
            }
        })?;

        let claims = data.claims;
        let user_id =
            Uuid::parse_str(&claims.user_id).map_err(|_| TokenError::MalformedPayload)?;
        if claims.username.is_empty() || !is_valid_email(&claims.email) {
            return Err(TokenError::MalformedPayload);
        }

        Ok(AccessPayload {
            user_id,
            username: claims.username,
            email: claims.email,
        })
    }
}
