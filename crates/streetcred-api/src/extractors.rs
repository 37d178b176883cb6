//! # Request Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (or the `Query`
//! equivalent) so rejections become [`AppError::BadRequest`] with the
//! structured error body instead of axum's plain-text default. Request
//! types then [`Validate`] into the domain types the services accept.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use streetcred_core::ValidationError;

use crate::error::AppError;

/// Conversion of a raw request into checked domain values.
pub trait Validate {
    type Validated;

    fn validate(self) -> Result<Self::Validated, ValidationError>;
}

/// Unwrap a JSON body, mapping rejections to 422 `BAD_REQUEST`.
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Unwrap and validate a JSON body.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T::Validated, AppError> {
    Ok(extract_json(body)?.validate()?)
}

/// Unwrap and validate query parameters.
pub fn extract_validated_query<T: Validate>(
    query: Result<Query<T>, QueryRejection>,
) -> Result<T::Validated, AppError> {
    let Query(raw) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(raw.validate()?)
}
