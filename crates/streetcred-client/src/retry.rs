//! Transport retries for hosted API calls.
//!
//! An HTTP response, successful or not, is always returned as is. Which
//! transport failures are re-sent depends on whether the call is safe to
//! repeat: a write that timed out may already be committed server-side, so
//! writes are only re-sent when the connection was never established.

use std::future::Future;
use std::time::Duration;

/// Maximum number of retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries: 200ms, 400ms, 800ms.
const BASE_DELAY_MS: u64 = 200;

/// Which transport failures a call may re-send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retry {
    /// Reads and side-effect-free calls. Any transport failure.
    Idempotent,
    /// Inserts, updates, RPCs and uploads. Connection failures only.
    ConnectOnly,
}

impl Retry {
    fn permits(self, err: &reqwest::Error) -> bool {
        match self {
            Self::Idempotent => true,
            Self::ConnectOnly => err.is_connect(),
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt))
}

/// Send a request, re-sending permitted transport failures up to
/// [`MAX_RETRIES`] times.
pub(crate) async fn send<F, Fut>(policy: Retry, f: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if attempt < MAX_RETRIES && policy.permits(&e) => {
                let delay = backoff(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    ?policy,
                    "request failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
