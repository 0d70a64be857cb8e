use std::{convert::Infallible, sync::Arc};

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::{
    auth::{AuthUser, TokenError},
    error::ErrorBody,
    services::ServiceContext,
    state::AppState,
};

/// Why a request could not be authenticated. Each variant maps to a fixed
/// client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingToken,
    TokenExpired,
    InvalidToken,
    InvalidPayload,
    UserNotFound,
    AccountInactive,
    Failed,
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AccountInactive => StatusCode::FORBIDDEN,
            Self::Failed => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "No token provided",
            Self::TokenExpired => "Token expired",
            Self::InvalidToken => "Invalid token",
            Self::InvalidPayload => "Invalid token payload",
            Self::UserNotFound => "User not found",
            Self::AccountInactive => "User account is not active",
            Self::Failed => "Authentication failed",
        }
    }
}

impl From<TokenError> for AuthRejection {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::MalformedPayload => Self::InvalidPayload,
            TokenError::Invalid(_) => Self::InvalidToken,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message().to_string(),
            details: None,
        });
        (self.status(), body).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer token and re-reads the user row; the token's embedded
/// snapshot is never trusted for status.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AuthRejection> {
    let token = bearer_token(headers).ok_or(AuthRejection::MissingToken)?;
    let payload = state.signer.verify(token)?;

    let user = ServiceContext::from_state(state)
        .user()
        .find_by_id(payload.user_id)
        .await
        .map_err(|err| {
            error!(error = %err, user_id = %payload.user_id, "user lookup failed during authentication");
            AuthRejection::Failed
        })?
        .ok_or(AuthRejection::UserNotFound)?;

    let user = AuthUser::from(&user);
    if !user.status.is_active() {
        return Err(AuthRejection::AccountInactive);
    }
    Ok(user)
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Like [`require_auth`], but any failure lets the request through without
/// an identity.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
        }
        Err(AuthRejection::MissingToken) => {}
        Err(rejection) => debug!(reason = rejection.message(), "continuing unauthenticated"),
    }
    next.run(req).await
}

/// The user attached by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthRejection::MissingToken)
    }
}

/// The user attached by [`optional_auth`], if any.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
