//! Postgres connection pool and migrations.
//!
//! The server uses an eagerly connected pool so a bad `DATABASE_URL` fails at
//! startup.  The lazy variant exists for callers that may never touch the
//! database, such as router tests.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::DbError;

/// Shared pool type used by the repository functions and [`crate::PgRoadmapStore`].
pub type DbPool = PgPool;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

fn options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Connect to `database_url` with at most `max_connections` connections.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, DbError> {
    info!(max_connections, "connecting to roadmap database");
    Ok(options(max_connections).connect(database_url).await?)
}

/// Same as [`create_pool`] but defers connecting until first use.
pub fn create_lazy_pool(database_url: &str, max_connections: u32) -> Result<DbPool, DbError> {
    Ok(options(max_connections).connect_lazy(database_url)?)
}

/// Apply the `roadmaps` schema migrations embedded from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    info!("applying roadmap schema migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}
