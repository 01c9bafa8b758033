//! Storage implementations.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::StorageConfig;
use crate::interfaces::ledger::{PrintLedger, Result};

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteLedger;

/// Path value selecting a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Open the SQLite pool described by `config`.
///
/// In-memory databases live and die with their connection, so they get a
/// single connection that is never recycled.
pub async fn connect_pool(config: &StorageConfig) -> Result<SqlitePool> {
    let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

    if config.path == IN_MEMORY_PATH {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.busy_timeout(busy_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        return Ok(pool);
    }

    if let Some(parent) = std::path::Path::new(&config.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Initialize the ledger based on configuration.
///
/// Connects, creates the schema if missing and returns the ledger ready
/// to be shared between request handlers.
pub async fn init_storage(config: &StorageConfig) -> Result<Arc<dyn PrintLedger>> {
    info!("Storage: sqlite at {}", config.path);

    let pool = connect_pool(config).await?;
    let ledger = SqliteLedger::new(pool);
    ledger.init().await?;

    Ok(Arc::new(ledger))
}
