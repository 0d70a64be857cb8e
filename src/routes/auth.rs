use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthSession, AuthUser, ClientInfo},
    error::AppError,
    middleware::{
        CurrentUser, RateLimitLayer,
        rate_limit::{AUTH_LIMIT_MESSAGE, REFRESH_LIMIT_MESSAGE},
        require_auth,
    },
    services::{AuthService, LoginInput, RegisterInput, ServiceContext},
    state::AppState,
    validation::Validator,
};

// Missing fields deserialize as empty strings so they surface as
// field-level validation errors instead of body rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: AuthUser,
}

pub fn router(state: Arc<AppState>) -> Router {
    let credentials = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(RateLimitLayer::new(
            Arc::clone(&state.auth_limiter),
            AUTH_LIMIT_MESSAGE,
        ));

    let rotation = Router::new()
        .route("/refresh", post(refresh))
        .route_layer(RateLimitLayer::new(
            Arc::clone(&state.refresh_limiter),
            REFRESH_LIMIT_MESSAGE,
        ));

    let session = Router::new()
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_auth,
        ));

    Router::new()
        .merge(credentials)
        .merge(rotation)
        .merge(session)
        .with_state(state)
}

fn auth_service(state: &AppState) -> AuthService {
    ServiceContext::from_state(state).auth(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthSession>), AppError> {
    let username = body.username.trim();
    let email = body.email.trim();
    Validator::new()
        .username(username)
        .email(email)
        .new_password(&body.password)
        .finish()?;

    let input = RegisterInput {
        username,
        email,
        password: &body.password,
    };
    let session = auth_service(&state).register(input, &client).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthSession>, AppError> {
    let email = body.email.trim();
    Validator::new()
        .email(email)
        .required("password", &body.password, "Password is required")
        .finish()?;

    let input = LoginInput {
        email,
        password: &body.password,
    };
    let session = auth_service(&state).login(input, &client).await?;
    Ok(Json(session))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<AuthSession>, AppError> {
    validate_refresh_token(&body)?;
    let session = auth_service(&state)
        .refresh(&body.refresh_token, &client)
        .await?;
    Ok(Json(session))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_refresh_token(&body)?;
    auth_service(&state).logout(&body.refresh_token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully",
    }))
}

async fn logout_all(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, AppError> {
    auth_service(&state).logout_all(user.id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out from all devices",
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse { user })
}

fn validate_refresh_token(body: &RefreshRequest) -> Result<(), AppError> {
    Validator::new()
        .required(
            "refreshToken",
            &body.refresh_token,
            "Refresh token is required",
        )
        .finish()
}
