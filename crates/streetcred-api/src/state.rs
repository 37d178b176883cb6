//! # Application State
//!
//! Shared state for the Axum application: configuration, the report service
//! (which owns the reward engine), metrics, and the optional Postgres pool
//! used by the readiness probe.
//!
//! Backends are chosen at startup, so the collaborators are enums that
//! dispatch to the concrete store, blob store or classifier.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use streetcred_client::{GeminiClassifier, SupabaseRecords, SupabaseStorage};
use streetcred_core::{
    Badge, BadgeId, BadgePool, Coordinates, EarnedBadge, NewBadge, NewReport, PointsChange,
    Profile, Report, UserBadge, UserId,
};
use streetcred_rewards::{
    AwardInsert, BlobError, BlobStore, ClassifierError, FixedClassifier, LocationClassifier,
    MemoryStore, NearestNeighborhoodClassifier, RecordStore, ReportService, RewardEngine,
    StoreError,
};

use crate::auth::SecretString;
use crate::db::PgRecords;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimitConfig;

/// Record store backend.
#[derive(Debug, Clone)]
pub enum Records {
    Memory(MemoryStore),
    Rest(SupabaseRecords),
    Postgres(PgRecords),
}

/// Image storage backend.
#[derive(Debug, Clone)]
pub enum Blobs {
    Memory(MemoryStore),
    Supabase(SupabaseStorage),
}

/// Location classifier backend.
#[derive(Debug, Clone)]
pub enum Classifier {
    Gemini(GeminiClassifier),
    Nearest(NearestNeighborhoodClassifier),
    Fixed(FixedClassifier),
}

macro_rules! dispatch_records {
    ($self:ident, $s:ident => $call:expr) => {
        match $self {
            Records::Memory($s) => $call,
            Records::Rest($s) => $call,
            Records::Postgres($s) => $call,
        }
    };
}

impl RecordStore for Records {
    async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        dispatch_records!(self, s => s.profile(user_id).await)
    }

    async fn increment_points(
        &self,
        user_id: &UserId,
        delta: u32,
    ) -> Result<Option<PointsChange>, StoreError> {
        dispatch_records!(self, s => s.increment_points(user_id, delta).await)
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<Profile>, StoreError> {
        dispatch_records!(self, s => s.leaderboard(limit).await)
    }

    async fn awarded_milestones(
        &self,
        user_id: &UserId,
    ) -> Result<std::collections::BTreeSet<u32>, StoreError> {
        dispatch_records!(self, s => s.awarded_milestones(user_id).await)
    }

    async fn badge_pool(&self, pool: &BadgePool) -> Result<Vec<Badge>, StoreError> {
        dispatch_records!(self, s => s.badge_pool(pool).await)
    }

    async fn insert_badge(&self, badge: &NewBadge) -> Result<Badge, StoreError> {
        dispatch_records!(self, s => s.insert_badge(badge).await)
    }

    async fn insert_award(
        &self,
        user_id: &UserId,
        badge_id: BadgeId,
        milestone: u32,
    ) -> Result<AwardInsert, StoreError> {
        dispatch_records!(self, s => s.insert_award(user_id, badge_id, milestone).await)
    }

    async fn replace_award(
        &self,
        user_id: &UserId,
        milestone: u32,
        badge_id: BadgeId,
    ) -> Result<Option<UserBadge>, StoreError> {
        dispatch_records!(self, s => s.replace_award(user_id, milestone, badge_id).await)
    }

    async fn user_badges(&self, user_id: &UserId) -> Result<Vec<EarnedBadge>, StoreError> {
        dispatch_records!(self, s => s.user_badges(user_id).await)
    }

    async fn insert_report(&self, report: &NewReport) -> Result<Report, StoreError> {
        dispatch_records!(self, s => s.insert_report(report).await)
    }

    async fn reports_by_user(&self, user_id: &UserId) -> Result<Vec<Report>, StoreError> {
        dispatch_records!(self, s => s.reports_by_user(user_id).await)
    }

    async fn recent_reports(&self, limit: u32) -> Result<Vec<Report>, StoreError> {
        dispatch_records!(self, s => s.recent_reports(limit).await)
    }

    async fn all_reports(&self) -> Result<Vec<Report>, StoreError> {
        dispatch_records!(self, s => s.all_reports().await)
    }
}

impl BlobStore for Blobs {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        match self {
            Self::Memory(s) => s.upload(path, bytes, content_type).await,
            Self::Supabase(s) => s.upload(path, bytes, content_type).await,
        }
    }

    fn public_url(&self, path: &str) -> String {
        match self {
            Self::Memory(s) => s.public_url(path),
            Self::Supabase(s) => s.public_url(path),
        }
    }
}

impl LocationClassifier for Classifier {
    async fn classify(&self, at: &Coordinates) -> Result<String, ClassifierError> {
        match self {
            Self::Gemini(c) => c.classify(at).await,
            Self::Nearest(c) => c.classify(at).await,
            Self::Fixed(c) => c.classify(at).await,
        }
    }
}

pub type Engine = RewardEngine<Records, Classifier>;
pub type Reports = ReportService<Records, Blobs, Classifier>;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Static bearer token. `None` disables authentication.
    pub auth_token: Option<SecretString>,
    /// Allowed CORS origin. `None` allows any origin.
    pub cors_allow_origin: Option<String>,
    pub rate_limit: RateLimitConfig,
    /// Seed for badge draws. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            auth_token: None,
            cors_allow_origin: None,
            rate_limit: RateLimitConfig::default(),
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load from environment variables.
    ///
    /// - `PORT` (default 8000)
    /// - `AUTH_TOKEN` (unset or empty disables auth)
    /// - `CORS_ALLOW_ORIGIN`
    /// - `RATE_LIMIT_PER_MINUTE` (default 300, 0 disables)
    /// - `STREETCRED_SEED`
    ///
    /// Unparseable numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            auth_token: env_nonempty("AUTH_TOKEN").map(SecretString::new),
            cors_allow_origin: env_nonempty("CORS_ALLOW_ORIGIN"),
            rate_limit: RateLimitConfig {
                max_requests: env_parse("RATE_LIMIT_PER_MINUTE")
                    .unwrap_or(defaults.rate_limit.max_requests),
                window: Duration::from_secs(60),
            },
            seed: env_parse("STREETCRED_SEED"),
        }
    }
}

fn env_nonempty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = env_nonempty(var)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring unparseable environment variable");
            None
        }
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub reports: Arc<Reports>,
    pub metrics: Option<ApiMetrics>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// In-memory state with the nearest-neighborhood classifier and default
    /// configuration.
    pub fn new() -> Self {
        Self::in_memory(
            AppConfig::default(),
            MemoryStore::new(),
            Classifier::Nearest(NearestNeighborhoodClassifier),
        )
    }

    /// State over one in-memory store serving both records and images.
    pub fn in_memory(config: AppConfig, store: MemoryStore, classifier: Classifier) -> Self {
        Self::with_backends(
            config,
            Records::Memory(store.clone()),
            Blobs::Memory(store),
            classifier,
            None,
        )
    }

    pub fn with_backends(
        config: AppConfig,
        records: Records,
        blobs: Blobs,
        classifier: Classifier,
        db_pool: Option<PgPool>,
    ) -> Self {
        let engine = match config.seed {
            Some(seed) => RewardEngine::with_seed(records, classifier, seed),
            None => RewardEngine::new(records, classifier),
        };
        let metrics = match ApiMetrics::new() {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::error!(error = %e, "metrics registry unavailable, continuing without metrics");
                None
            }
        };
        Self {
            config,
            reports: Arc::new(ReportService::new(Arc::new(engine), blobs)),
            metrics,
            db_pool,
        }
    }

    pub fn engine(&self) -> &Engine {
        self.reports.engine()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_enum_dispatches_to_memory() {
        let store = MemoryStore::new();
        store.upsert_profile(UserId::new("alice").unwrap(), None, 3);
        let records = Records::Memory(store);
        let profile = records
            .profile(&UserId::new("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.points, 3);
    }

    #[tokio::test]
    async fn classifier_enum_dispatches() {
        let at = Coordinates::new(40.8120, -73.9462).unwrap();
        let nearest = Classifier::Nearest(NearestNeighborhoodClassifier);
        let fixed = Classifier::Fixed(FixedClassifier::new("BlackRock"));
        assert_eq!(nearest.classify(&at).await.unwrap(), "Harlem");
        assert_eq!(fixed.classify(&at).await.unwrap(), "BlackRock");
    }

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8000);
        assert!(config.auth_token.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn new_state_has_metrics() {
        assert!(AppState::new().metrics.is_some());
    }
}
