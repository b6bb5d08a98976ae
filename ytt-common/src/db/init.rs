//! Store initialization
//!
//! The analytical store is a single SQLite file. The pipeline holds one
//! read-write pool for the duration of a run; the query service holds one
//! read-only pool for its lifetime.

use crate::db::table_schemas::pipeline_runs_table;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the store for a pipeline run
pub async fn init_store(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // WAL lets readers of the previous run keep their snapshot while the
    // writer stages and swaps the new tables
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new store: {}", db_path.display());
    } else {
        info!("Opened existing store: {}", db_path.display());
    }

    let runs = pipeline_runs_table();
    sqlx::query(&runs.create_sql(runs.name).replacen("CREATE TABLE", "CREATE TABLE IF NOT EXISTS", 1))
        .execute(&pool)
        .await?;

    Ok(pool)
}

/// Open an existing store read-only
pub async fn open_store_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Store not found: {} (run ytt-pipeline first to build it)",
            db_path.display()
        )));
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .read_only(true)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::table_exists;

    #[tokio::test]
    async fn test_init_store_creates_file_and_run_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.sqlite");

        let pool = init_store(&path).await.unwrap();
        assert!(path.exists());
        assert!(table_exists(&pool, "pipeline_runs").await.unwrap());
        pool.close().await;

        // Reopening is idempotent
        let pool = init_store(&path).await.unwrap();
        assert!(table_exists(&pool, "pipeline_runs").await.unwrap());
    }

    #[tokio::test]
    async fn test_readonly_missing_store_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_store_readonly(&dir.path().join("missing.sqlite")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_readonly_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite");
        init_store(&path).await.unwrap().close().await;

        let pool = open_store_readonly(&path).await.unwrap();
        let write = sqlx::query("CREATE TABLE _probe (id INTEGER)")
            .execute(&pool)
            .await;
        assert!(write.is_err(), "read-only pool must reject writes");
    }
}
