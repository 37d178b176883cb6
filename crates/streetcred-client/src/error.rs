//! Client error types and their mapping onto the service-layer errors.

use serde::Deserialize;
use streetcred_rewards::{BlobError, ClassifierError, StoreError};

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// The part of a PostgREST error body that carries the SQLSTATE.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
}

/// Errors from hosted API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response decoded but lacked an expected element, e.g. an insert
    /// that returned no row.
    #[error("unexpected response from {endpoint}: {detail}")]
    Unexpected { endpoint: String, detail: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

impl ClientError {
    /// SQLSTATE of a rejected PostgREST call, when the body carries one.
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            Self::ApiError { body, .. } => serde_json::from_str::<PostgrestError>(body).ok()?.code,
            _ => None,
        }
    }

    pub(crate) fn into_store_error(self, operation: &'static str) -> StoreError {
        if self.sqlstate().as_deref() == Some(NUMERIC_OUT_OF_RANGE) {
            return StoreError::OutOfRange {
                operation,
                message: self.to_string(),
            };
        }
        match self {
            Self::Http { .. } | Self::Config(_) => StoreError::Unavailable(self.to_string()),
            Self::ApiError { .. } => StoreError::Rejected {
                operation,
                message: self.to_string(),
            },
            Self::Deserialization { .. } | Self::Unexpected { .. } => StoreError::Decode {
                operation,
                message: self.to_string(),
            },
        }
    }

    pub(crate) fn into_blob_error(self, path: &str) -> BlobError {
        match self {
            Self::ApiError { .. } => BlobError::Rejected {
                path: path.to_string(),
                message: self.to_string(),
            },
            other => BlobError::Unavailable(other.to_string()),
        }
    }

    pub(crate) fn into_classifier_error(self) -> ClassifierError {
        match self {
            Self::Http { .. } | Self::Config(_) => ClassifierError::Unavailable(self.to_string()),
            other => ClassifierError::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(body: &str) -> ClientError {
        ClientError::ApiError {
            endpoint: "POST /rest/v1/rpc/increment_points".into(),
            status: 400,
            body: body.into(),
        }
    }

    #[test]
    fn sqlstate_read_from_postgrest_body() {
        let err = api_error(r#"{"code":"22003","message":"integer out of range"}"#);
        assert_eq!(err.sqlstate().as_deref(), Some("22003"));
        assert_eq!(api_error("plain text").sqlstate(), None);
    }

    #[test]
    fn numeric_overflow_maps_to_out_of_range() {
        let err = api_error(r#"{"code":"22003","message":"integer out of range"}"#)
            .into_store_error("increment_points");
        assert!(matches!(err, StoreError::OutOfRange { operation: "increment_points", .. }));

        let err = api_error(r#"{"code":"42501","message":"permission denied"}"#)
            .into_store_error("increment_points");
        assert!(matches!(err, StoreError::Rejected { .. }));
    }

    #[test]
    fn missing_row_is_decode() {
        let err = ClientError::Unexpected {
            endpoint: "POST /rest/v1/reports".into(),
            detail: "insert returned no row".into(),
        }
        .into_store_error("insert_report");
        assert!(matches!(err, StoreError::Decode { operation: "insert_report", .. }));
    }
}
