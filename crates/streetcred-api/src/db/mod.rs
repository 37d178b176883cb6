//! # Database Persistence Layer
//!
//! Direct Postgres backend for self-hosted deployments. When `DATABASE_URL`
//! is set the API uses [`PgRecords`] instead of the hosted PostgREST store.
//! The schema ships as an embedded migration; the same
//! `increment_points` function serves both backends.

pub mod records;

pub use records::PgRecords;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect and apply embedded migrations.
pub async fn init_pool(url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
