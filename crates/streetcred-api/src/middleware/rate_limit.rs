//! # Rate Limiting
//!
//! Fixed-window request quota per client. The client key is the first
//! `X-Forwarded-For` hop, falling back to a shared `anonymous` bucket.
//! Requests over quota get 429 with the structured error body.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::AppError;

const ANONYMOUS: &str = "anonymous";

/// Windows are swept once the table holds this many clients.
const SWEEP_THRESHOLD: usize = 4096;

/// Quota settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window. Zero disables limiting.
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 300,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Shared limiter state, installed as a request extension.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request from `client`; `false` if it exceeds the quota.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        if self.config.max_requests == 0 {
            return true;
        }
        let mut windows = self.windows.lock();
        if windows.len() >= SWEEP_THRESHOLD {
            let window = self.config.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.config.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.config.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }
}

fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string()
}

/// Reject requests beyond the client's quota.
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    if let Some(limiter) = request.extensions().get::<RateLimiter>() {
        let client = client_key(&request);
        if !limiter.check(&client) {
            tracing::warn!(client = %client, "rate limit exceeded");
            return AppError::RateLimited("too many requests, retry later".to_string())
                .into_response();
        }
    }
    next.run(request).await
}
