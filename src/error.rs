// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::identity::IdentityError;
use crate::media::MediaError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 404, but retryable: the caller's identity mirror row has not been
    // synced by the webhook yet. Distinct code so clients can retry.
    NotReady(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 500: an external service call (media upload/delete) failed
    UpstreamFailure(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::NotReady(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::UpstreamFailure(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::NotReady(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::UpstreamFailure(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::NotReady(_) => "USER_NOT_READY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        ApiError::NotReady(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn upstream_failure(message: impl Into<String>) -> Self {
        ApiError::UpstreamFailure(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found("Record not found"),
            StoreError::Conflict(field) => {
                ApiError::bad_request(format!("Duplicate value for {}", field))
            }
            StoreError::ForeignKeyViolation(msg) => {
                tracing::error!("Referential constraint violation: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return a generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        tracing::error!("Media service error: {}", err);
        ApiError::upstream_failure("Media service request failed")
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        tracing::error!("Identity provider error: {}", err);
        ApiError::internal_server_error("Identity provider request failed")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
