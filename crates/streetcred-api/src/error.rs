//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps validation and reward-service errors to HTTP status codes with a
//! JSON body of error code, message, and optional details. Upstream
//! failure details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use streetcred_rewards::{RewardError, StoreError};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or query could not be parsed (422).
    ///
    /// Shares the 422 status with `Validation`: the HTTP framing was fine,
    /// the content was not.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Client exceeded its request quota (429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),

    /// Record store, blob store or classifier failed (502).
    #[error("upstream error: {0}")]
    UpstreamError(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream service error"),
            _ => {}
        }

        let details = match &self {
            Self::Validation(reason) | Self::BadRequest(reason) => {
                Some(serde_json::json!({ "reason": reason }))
            }
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<streetcred_core::ValidationError> for AppError {
    fn from(err: streetcred_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RewardError> for AppError {
    fn from(err: RewardError) -> Self {
        match err {
            RewardError::UnknownUser(user_id) => {
                Self::NotFound(format!("profile for user {user_id} not found"))
            }
            RewardError::Invalid(e) => e.into(),
            // The request asked for a value the column cannot hold.
            RewardError::Store(StoreError::OutOfRange { message, .. }) => Self::Validation(message),
            other => Self::UpstreamError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use streetcred_core::UserId;
    use streetcred_rewards::ClassifierError;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            (AppError::BadRequest("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            (AppError::UpstreamError("x".into()), StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code));
        }
    }

    #[test]
    fn unknown_user_is_not_found() {
        let err = AppError::from(RewardError::UnknownUser(UserId::new("ghost").unwrap()));
        assert!(matches!(&err, AppError::NotFound(msg) if msg.contains("ghost")));
    }

    #[test]
    fn dependency_failures_are_upstream() {
        let store = AppError::from(RewardError::Store(StoreError::Unavailable("down".into())));
        let classifier =
            AppError::from(RewardError::Classifier(ClassifierError::EmptyResponse));
        assert!(matches!(store, AppError::UpstreamError(_)));
        assert!(matches!(classifier, AppError::UpstreamError(_)));
    }

    #[test]
    fn client_caused_service_errors_are_validation() {
        let radius = AppError::from(RewardError::Invalid(
            streetcred_core::ValidationError::InvalidRadius(0.0),
        ));
        assert!(matches!(&radius, AppError::Validation(msg) if msg.contains("radius_km")));

        let overflow = AppError::from(RewardError::Store(StoreError::OutOfRange {
            operation: "increment_points",
            message: "integer out of range".into(),
        }));
        assert!(matches!(&overflow, AppError::Validation(msg) if msg.contains("out of range")));
    }

    #[tokio::test]
    async fn upstream_hides_details() {
        let (status, body) =
            response_parts(AppError::UpstreamError("connection refused to 10.0.0.5".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "UPSTREAM_ERROR");
        assert!(!body.error.message.contains("10.0.0.5"));
        assert!(body.error.details.is_none());
    }

    #[tokio::test]
    async fn validation_carries_reason() {
        let (status, body) = response_parts(AppError::from(
            streetcred_core::ValidationError::NegativePoints(-3),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert!(body.error.message.contains("-3"));
        assert!(body.error.details.is_some());
    }

    #[test]
    fn error_body_skips_missing_details() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message: "gone".to_string(),
                details: None,
            },
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }
}
