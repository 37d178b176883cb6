//! # Error Hierarchy
//!
//! One error enum per collaborator plus [`RewardError`] for the services.
//! Backends map their transport and protocol failures into these; the API
//! layer maps them to HTTP status codes.

use streetcred_core::{UserId, ValidationError};
use thiserror::Error;

/// Record store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or timed out.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an error.
    #[error("record store rejected {operation}: {message}")]
    Rejected {
        /// The logical operation, e.g. `insert_report`.
        operation: &'static str,
        /// Store-provided detail.
        message: String,
    },

    /// The write would push a value outside its column's range.
    #[error("{operation} out of range: {message}")]
    OutOfRange {
        /// The logical operation.
        operation: &'static str,
        /// Store-provided detail.
        message: String,
    },

    /// The store answered with data that does not match the expected shape.
    #[error("unexpected record store response for {operation}: {message}")]
    Decode {
        /// The logical operation.
        operation: &'static str,
        /// Decoder detail.
        message: String,
    },
}

/// Blob store failures.
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    #[error("blob store rejected upload of {path}: {message}")]
    Rejected {
        /// Object path that was refused.
        path: String,
        /// Store-provided detail.
        message: String,
    },
}

/// Location classifier failures.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier rejected request: {0}")]
    Rejected(String),

    /// The classifier answered but named no location.
    #[error("classifier returned no location name")]
    EmptyResponse,
}

/// Failures of the reward and report services.
#[derive(Error, Debug)]
pub enum RewardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// No profile exists for the user.
    #[error("no profile for user {0}")]
    UnknownUser(UserId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_names_operation() {
        let err = StoreError::Rejected {
            operation: "insert_report",
            message: "permission denied".into(),
        };
        assert_eq!(
            err.to_string(),
            "record store rejected insert_report: permission denied"
        );
    }

    #[test]
    fn out_of_range_names_operation() {
        let err = StoreError::OutOfRange {
            operation: "increment_points",
            message: "integer out of range".into(),
        };
        assert_eq!(
            err.to_string(),
            "increment_points out of range: integer out of range"
        );
    }

    #[test]
    fn reward_error_is_transparent_over_sources() {
        let err: RewardError = ClassifierError::EmptyResponse.into();
        assert_eq!(err.to_string(), "classifier returned no location name");
    }
}
