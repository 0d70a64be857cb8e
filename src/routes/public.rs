use std::sync::Arc;

use axum::{Json, Router, middleware, routing::get};
use serde::Serialize;

use crate::{
    auth::AuthUser,
    middleware::{MaybeUser, optional_auth},
    state::AppState,
};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HelloResponse {
    message: &'static str,
    user: Option<AuthUser>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let hello = Router::new()
        .route("/hello", get(hello))
        .route_layer(middleware::from_fn_with_state(state, optional_auth));

    Router::new().route("/health", get(health)).merge(hello)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn hello(MaybeUser(user): MaybeUser) -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello World!",
        user,
    })
}
