//! # Validation Errors
//!
//! Every input rejected before an external call maps to one of these
//! variants. Each carries the offending value and the accepted range so a
//! client can correct the request without guesswork.

use thiserror::Error;

/// Validation errors for request inputs and domain newtypes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// User identifier is empty after trimming.
    #[error("user_id must not be empty")]
    EmptyUserId,

    /// User identifier is longer than the accepted maximum.
    #[error("user_id must not exceed {max} characters")]
    UserIdTooLong {
        /// Maximum accepted length.
        max: usize,
    },

    /// User identifier contains characters outside `[A-Za-z0-9._-]`.
    #[error("invalid user_id: \"{0}\" (expected letters, digits, '.', '_' or '-')")]
    InvalidUserId(String),

    /// Latitude is NaN, infinite, or outside [-90, 90].
    #[error("latitude must be a finite value in [-90, 90], got {0}")]
    InvalidLatitude(f64),

    /// Longitude is NaN, infinite, or outside [-180, 180].
    #[error("longitude must be a finite value in [-180, 180], got {0}")]
    InvalidLongitude(f64),

    /// Point value is negative.
    #[error("points must be non-negative, got {0}")]
    NegativePoints(i64),

    /// Point value does not fit the stored integer column.
    #[error("points must not exceed {max}, got {value}")]
    PointsOutOfRange {
        /// The rejected value.
        value: i64,
        /// Largest accepted value.
        max: u32,
    },

    /// Report description is empty after trimming.
    #[error("description must not be empty")]
    EmptyDescription,

    /// Report description is longer than the accepted maximum.
    #[error("description must not exceed {max} characters")]
    DescriptionTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },

    /// Search radius is NaN, infinite, zero or negative.
    #[error("radius_km must be a finite positive number, got {0}")]
    InvalidRadius(f64),

    /// Pagination limit outside the accepted range.
    #[error("limit must be between {min} and {max}, got {value}")]
    LimitOutOfRange {
        /// The rejected value.
        value: i64,
        /// Smallest accepted value.
        min: u32,
        /// Largest accepted value.
        max: u32,
    },

    /// Image extension is not a short alphanumeric token.
    #[error("invalid image extension: \"{0}\" (expected 1-5 alphanumeric characters)")]
    InvalidImageExtension(String),

    /// Embedded image data could not be decoded.
    #[error("image data is not valid base64: {0}")]
    InvalidImageEncoding(String),

    /// Image payload has no bytes.
    #[error("image data must not be empty")]
    EmptyImage,

    /// Milestone is not a positive multiple of the milestone step.
    #[error("invalid milestone: {0} (expected a positive multiple of 5)")]
    InvalidMilestone(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_error_carries_value() {
        let msg = ValidationError::InvalidLatitude(91.5).to_string();
        assert!(msg.contains("91.5"));
        assert!(msg.contains("[-90, 90]"));
    }

    #[test]
    fn limit_error_carries_range() {
        let msg = ValidationError::LimitOutOfRange {
            value: 0,
            min: 1,
            max: 100,
        }
        .to_string();
        assert!(msg.contains("between 1 and 100"));
        assert!(msg.contains("got 0"));
    }

    #[test]
    fn user_id_error_quotes_input() {
        let msg = ValidationError::InvalidUserId("a b".into()).to_string();
        assert!(msg.contains("\"a b\""));
    }
}
