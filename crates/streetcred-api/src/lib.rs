//! # streetcred-api — Axum API Service for StreetCred
//!
//! HTTP surface over the reward engine and report service.
//!
//! ## API Surface
//!
//! | Prefix            | Module               | Domain                         |
//! |-------------------|----------------------|--------------------------------|
//! | `/api/badges/*`   | [`routes::badges`]   | Points, milestones, leaderboard |
//! | `/api/reports/*`  | [`routes::reports`]  | Report submission and search   |
//! | `/openapi.json`   | [`openapi`]          | Generated OpenAPI document     |
//! | `/health/*`       | this module          | Liveness and readiness probes  |
//! | `/metrics`        | this module          | Prometheus scrape endpoint     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → RateLimitMiddleware → Handler
//! ```
//!
//! Health probes, `/metrics` and `/openapi.json` are served without
//! credentials.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::auth::AuthConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Default body limit for API routes. The submit route raises its own.
const API_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let limiter = RateLimiter::new(state.config.rate_limit);

    // Auth runs before rate limiting so rejected credentials do not consume
    // quota.
    let mut api = Router::new()
        .merge(routes::badges::router())
        .merge(routes::reports::router())
        .layer(DefaultBodyLimit::max(API_BODY_LIMIT))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(from_fn(auth::auth_middleware));

    if let Some(metrics) = state.metrics.clone() {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics));
    }

    let api = api
        .layer(Extension(auth_config))
        .layer(Extension(limiter))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .merge(openapi::router())
        .with_state(state.clone());

    let router = Router::new().merge(unauthenticated).merge(api);
    let cors = cors_layer(state.config.cors_allow_origin.as_deref());
    middleware::tracing_layer::apply(router).layer(cors)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let permissive = CorsLayer::permissive();
    let Some(origin) = origin else {
        return permissive;
    };
    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(value))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        Err(_) => {
            tracing::warn!(origin, "invalid CORS_ALLOW_ORIGIN, allowing any origin");
            permissive
        }
    }
}

/// Liveness probe: 200 while the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 when the database, if configured, answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
        }
    }
    (StatusCode::OK, "ready")
}

/// GET /metrics — Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let Some(metrics) = &state.metrics else {
        return (StatusCode::NOT_FOUND, "metrics disabled".to_string()).into_response();
    };
    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed".to_string())
                .into_response()
        }
    }
}
