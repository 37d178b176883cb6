//! Client configuration.
//!
//! Both configs load from environment variables and can be constructed
//! directly for tests. Custom `Debug` implementations redact API keys.

use url::Url;

/// Default object-storage bucket for report images.
pub const DEFAULT_BUCKET: &str = "report_images";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a Supabase project (record store + storage).
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: Url,
    /// Service or anon key, sent as `apikey` and bearer token.
    pub api_key: String,
    /// Bucket holding report images.
    pub bucket: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SupabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SUPABASE_URL` (fallback `NEXT_PUBLIC_SUPABASE_URL`, required)
    /// - `SUPABASE_KEY` (fallback `NEXT_PUBLIC_SUPABASE_ANON_KEY`, required)
    /// - `SUPABASE_BUCKET` (default: `report_images`)
    /// - `SUPABASE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env_first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"])
            .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let api_key = env_first(&["SUPABASE_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"])
            .ok_or(ConfigError::Missing("SUPABASE_KEY"))?;
        Ok(Self {
            url: parse_url("SUPABASE_URL", &raw_url)?,
            api_key,
            bucket: std::env::var("SUPABASE_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            timeout_secs: env_secs("SUPABASE_TIMEOUT_SECS"),
        })
    }

    /// Whether the environment names a Supabase project at all.
    pub fn is_configured() -> bool {
        env_first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]).is_some()
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(base: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url("mock", base)?,
            api_key: api_key.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            timeout_secs: 5,
        })
    }
}

/// Connection settings for the Gemini text-generation API.
#[derive(Clone)]
pub struct GeminiConfig {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `GEMINI_API_KEY` (fallback `GOOGLE_API_KEY`, required)
    /// - `GEMINI_MODEL` (default: `gemini-2.0-flash-exp`)
    /// - `GEMINI_BASE_URL` (default: `https://generativelanguage.googleapis.com`)
    /// - `GEMINI_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_first(&["GEMINI_API_KEY", "GOOGLE_API_KEY"])
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;
        let raw_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        Ok(Self {
            base_url: parse_url("GEMINI_BASE_URL", &raw_url)?,
            api_key,
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            timeout_secs: env_secs("GEMINI_TIMEOUT_SECS"),
        })
    }

    /// Whether the environment carries a Gemini key.
    pub fn is_configured() -> bool {
        env_first(&["GEMINI_API_KEY", "GOOGLE_API_KEY"]).is_some()
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(base: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("mock", base)?,
            api_key: api_key.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_secs: 5,
        })
    }
}

/// First non-empty value among `vars`.
fn env_first(vars: &[&str]) -> Option<String> {
    vars.iter()
        .filter_map(|v| std::env::var(v).ok())
        .find(|v| !v.trim().is_empty())
}

fn env_secs(var: &str) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("API key is not a valid header value")]
    InvalidKey,
}
