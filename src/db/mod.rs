pub mod checkpoints;
pub mod employees;
pub mod reports;
pub mod schedules;
pub mod worklogs;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::Result;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to the store and brings the schema up to date.
///
/// WAL lets readers run beside the single writer; the busy timeout covers
/// writers from other processes.
pub async fn init_db(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(max_connections, "Database ready");

    Ok(pool)
}
