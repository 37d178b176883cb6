//! # Bearer Token Authentication
//!
//! Optional static token. When `AUTH_TOKEN` is set, every `/api/*` request
//! must carry `Authorization: Bearer <token>`; health probes, `/metrics`
//! and `/openapi.json` stay open. The comparison is constant-time.

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// A secret that never appears in `Debug` output.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

/// Authentication settings, installed as a request extension.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub token: Option<SecretString>,
}

impl AuthConfig {
    /// Whether `header` (the raw `Authorization` value) grants access.
    fn permits(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };
        let Some(presented) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return false;
        };
        bool::from(presented.as_bytes().ct_eq(expected.expose().as_bytes()))
    }
}

/// Reject requests without a valid bearer token.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !config.permits(header) {
        tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return AppError::Unauthorized("missing or invalid bearer token".to_string())
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(token: &str) -> AuthConfig {
        AuthConfig {
            token: Some(SecretString::new(token)),
        }
    }

    #[test]
    fn no_token_configured_permits_everything() {
        let config = AuthConfig::default();
        assert!(config.permits(None));
        assert!(config.permits(Some("Bearer anything")));
    }

    #[test]
    fn token_must_match_exactly() {
        let config = with_token("s3cret");
        assert!(config.permits(Some("Bearer s3cret")));
        assert!(!config.permits(Some("Bearer s3cre")));
        assert!(!config.permits(Some("Bearer s3cret ")));
        assert!(!config.permits(Some("s3cret")));
        assert!(!config.permits(Some("Basic s3cret")));
        assert!(!config.permits(None));
    }

    #[test]
    fn debug_redacts() {
        let out = format!("{:?}", with_token("s3cret"));
        assert!(!out.contains("s3cret"));
    }
}
