use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid query: {0}")]
    Validation(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    /// Classifies a transport-level failure from an outbound call.
    pub fn from_transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ApiError::ServiceUnavailable(format!("{} unreachable: {}", service, err))
        } else {
            ApiError::Internal(format!("{} request failed: {}", service, err))
        }
    }

    /// Maps a non-success HTTP status from a remote API onto the error taxonomy.
    pub fn from_status(service: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, body.trim())
        };
        match status.as_u16() {
            401 | 403 => ApiError::Authentication(format!("{} rejected credential ({})", service, detail)),
            408 | 429 | 500..=599 => {
                ApiError::ServiceUnavailable(format!("{} returned {}", service, detail))
            }
            _ => ApiError::Internal(format!("{} returned {}", service, detail)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Configuration(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "Upstream authentication failed".to_string(),
            ),
            ApiError::ServiceUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        tracing::warn!("Request failed: {}", self);

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
