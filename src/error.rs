use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{db::dao::DaoLayerError, validation::FieldErrors};

const INTERNAL_MESSAGE: &str = "Internal server error";
const VALIDATION_MESSAGE: &str = "Validation error";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(FieldErrors),
    Unauthorized(String),
    TooManyRequests {
        message: String,
        retry_after_secs: u64,
    },
    /// Detail is logged, never sent to the client.
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn validation(details: FieldErrors) -> Self {
        Self::Validation(details)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::TooManyRequests {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Internal(message) => message.as_str(),
            Self::TooManyRequests { message, .. } => message.as_str(),
            Self::Validation(_) => VALIDATION_MESSAGE,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<DaoLayerError> for AppError {
    fn from(err: DaoLayerError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::internal(format!("Database error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = match &self {
            Self::TooManyRequests {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let body = match self {
            Self::Internal(detail) => {
                tracing::error!(status = status.as_u16(), error = %detail, "request failed");
                ErrorBody {
                    error: INTERNAL_MESSAGE.to_string(),
                    details: None,
                }
            }
            Self::Validation(details) => ErrorBody {
                error: VALIDATION_MESSAGE.to_string(),
                details: Some(details),
            },
            other => ErrorBody {
                error: other.message().to_string(),
                details: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::to_bytes,
        http::{StatusCode, header},
        response::IntoResponse,
    };
    use serde_json::Value;

    use super::AppError;
    use crate::validation::FieldErrors;

    async fn body_json(err: AppError) -> (StatusCode, Value, axum::http::HeaderMap) {
        let response = err.into_response();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json = serde_json::from_slice(&bytes).expect("body should be json");
        (status, json, headers)
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let (status, json, _) = body_json(AppError::internal("connection refused")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn validation_errors_carry_details() {
        let mut details = FieldErrors::new();
        details.insert("email".to_string(), vec!["Invalid email format".to_string()]);

        let (status, json, _) = body_json(AppError::validation(details)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Validation error");
        assert_eq!(json["details"]["email"][0], "Invalid email format");
    }

    #[tokio::test]
    async fn too_many_requests_sets_retry_after() {
        let (status, json, headers) =
            body_json(AppError::too_many_requests("slow down", 42)).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], "slow down");
        assert_eq!(
            headers
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("42")
        );
    }

    #[tokio::test]
    async fn plain_errors_have_no_details_field() {
        let (status, json, _) = body_json(AppError::unauthorized("Token expired")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Token expired");
        assert!(json.get("details").is_none());
    }
}
