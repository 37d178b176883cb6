//! # streetcred-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Backends are chosen from the environment:
//!
//! - `DATABASE_URL` set: records in Postgres (migrations applied on start).
//! - otherwise `SUPABASE_URL` set: records through the Supabase REST API.
//! - otherwise: in-memory development store.
//!
//! Report images go to Supabase Storage when Supabase is configured, and to
//! memory otherwise. The location classifier is Gemini when `GEMINI_API_KEY`
//! is set, and the offline nearest-neighborhood classifier otherwise.

use streetcred_api::state::{AppConfig, AppState, Blobs, Classifier, Records};
use streetcred_client::{GeminiClassifier, GeminiConfig, SupabaseClient, SupabaseConfig};
use streetcred_rewards::{MemoryStore, NearestNeighborhoodClassifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set, API routes are unauthenticated");
    }

    let supabase = if SupabaseConfig::is_configured() {
        let client = SupabaseConfig::from_env()
            .map_err(Box::<dyn std::error::Error>::from)
            .and_then(|cfg| SupabaseClient::new(cfg).map_err(Into::into))
            .map_err(|e| {
                tracing::error!("Supabase client configuration failed: {e}");
                e
            })?;
        tracing::info!("Supabase client configured");
        Some(client)
    } else {
        None
    };

    let (records, db_pool) = match std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()) {
        Some(url) => {
            let pool = streetcred_api::db::init_pool(&url).await.map_err(|e| {
                tracing::error!("Database initialization failed: {e}");
                e
            })?;
            (
                Records::Postgres(streetcred_api::db::PgRecords::new(pool.clone())),
                Some(pool),
            )
        }
        None => match &supabase {
            Some(client) => (Records::Rest(client.records().clone()), None),
            None => {
                tracing::warn!(
                    "Neither DATABASE_URL nor SUPABASE_URL is set. Using the in-memory store; data is lost on restart."
                );
                (Records::Memory(MemoryStore::new()), None)
            }
        },
    };

    let blobs = match &supabase {
        Some(client) => Blobs::Supabase(client.storage().clone()),
        None => {
            tracing::warn!("Supabase storage not configured, report images kept in memory");
            Blobs::Memory(MemoryStore::new())
        }
    };

    let classifier = if GeminiConfig::is_configured() {
        let classifier = GeminiConfig::from_env()
            .map_err(Box::<dyn std::error::Error>::from)
            .and_then(|cfg| GeminiClassifier::from_config(cfg).map_err(Into::into))
            .map_err(|e| {
                tracing::error!("Gemini classifier configuration failed: {e}");
                e
            })?;
        tracing::info!(model = classifier.model(), "Gemini classifier configured");
        Classifier::Gemini(classifier)
    } else {
        tracing::warn!("GEMINI_API_KEY not set, classifying locations by nearest neighborhood");
        Classifier::Nearest(NearestNeighborhoodClassifier)
    };

    let port = config.port;
    let state = AppState::with_backends(config, records, blobs, classifier, db_pool);
    let app = streetcred_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("StreetCred API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
