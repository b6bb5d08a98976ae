//! Store access for ytt-query
//!
//! All connections are read-only; the pipeline is the only writer.

use crate::error::QueryResult;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;
use ytt_common::db::{table_exists, TRENDING};

/// Connect to the analytical store in read-only mode
///
/// Fails with `NotFound` when the store file does not exist yet. A store
/// without the fact table (pipeline never completed) is accepted with a
/// warning; lookups then return database errors until a run completes.
pub async fn connect_readonly(db_path: &Path) -> QueryResult<SqlitePool> {
    let pool = ytt_common::db::open_store_readonly(db_path).await?;

    if table_exists(&pool, TRENDING).await? {
        info!("Connected to store (read-only): {}", db_path.display());
    } else {
        tracing::warn!(
            "Store {} has no {} table yet; run ytt-pipeline to build it",
            db_path.display(),
            TRENDING
        );
    }
    Ok(pool)
}
