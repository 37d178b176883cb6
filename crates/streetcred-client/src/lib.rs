//! # streetcred-client -- Typed clients for StreetCred's hosted collaborators
//!
//! - **Record store** via Supabase PostgREST (`/rest/v1`)
//! - **Object storage** via Supabase Storage (`/storage/v1/object`)
//! - **Location classifier** via the Gemini `generateContent` API
//!
//! Each client implements the matching `streetcred-rewards` trait
//! ([`RecordStore`](streetcred_rewards::RecordStore),
//! [`BlobStore`](streetcred_rewards::BlobStore),
//! [`LocationClassifier`](streetcred_rewards::LocationClassifier)) so the
//! services never see HTTP.
//!
//! Transport failures are retried with exponential backoff (200ms, 400ms,
//! 800ms); a received response is never retried. Selects and Gemini calls
//! retry any transport failure. Inserts, updates, the point-increment RPC
//! and uploads are re-sent only when the connection was never established,
//! so a write the server may have committed is sent exactly once.

pub mod config;
pub mod error;
pub mod gemini;
pub mod postgrest;
pub mod records;
pub(crate) mod retry;
pub mod storage;

pub use config::{ConfigError, GeminiConfig, SupabaseConfig};
pub use error::ClientError;
pub use gemini::GeminiClassifier;
pub use records::SupabaseRecords;
pub use storage::SupabaseStorage;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Supabase project client. Holds the record-store and storage sub-clients,
/// which share one connection pool.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    records: SupabaseRecords,
    storage: SupabaseStorage,
}

impl SupabaseClient {
    /// Create a client from configuration.
    pub fn new(config: SupabaseConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::InvalidKey)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ConfigError::InvalidKey)?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let http = build_http(config.timeout_secs, headers)?;
        Ok(Self {
            records: SupabaseRecords::new(http.clone(), config.url.clone()),
            storage: SupabaseStorage::new(http, config.url, config.bucket),
        })
    }

    /// The record-store client.
    pub fn records(&self) -> &SupabaseRecords {
        &self.records
    }

    /// The storage client.
    pub fn storage(&self) -> &SupabaseStorage {
        &self.storage
    }
}

impl GeminiClassifier {
    /// Create a classifier from configuration.
    pub fn from_config(config: GeminiConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key).map_err(|_| ConfigError::InvalidKey)?;
        headers.insert("x-goog-api-key", key);
        let http = build_http(config.timeout_secs, headers)?;
        Ok(Self::new(http, config.base_url, config.model))
    }
}

fn build_http(timeout_secs: u64, headers: HeaderMap) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| ClientError::Http {
            endpoint: "client_init".into(),
            source: e,
        })
}
