// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use crate::migration::run_migrations;
use drivebook_core::error::Result;
use drivebook_core::SchedulingConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Create SQLite connection pool (WAL, foreign keys on every connection)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(map_sqlx_error)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)?;

    debug!(database_url = database_url, "SQLite pool ready");
    Ok(pool)
}

/// Open the configured database and bring its schema up to date
pub async fn open_database(config: &SchedulingConfig) -> Result<SqlitePool> {
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
