//! Staged rebuild with atomic swap
//!
//! A run never mutates live tables. Each table is written to
//! `<name>__staging`; once every table is complete, one transaction drops the
//! views, replaces each live table with its staged copy, rebuilds indexes and
//! recreates the views. Readers on other connections see either the complete
//! previous table set or the complete new one. If the run aborts before the
//! swap, the previous tables are untouched and the leftover staging tables
//! are cleared at the start of the next run.

use crate::db::schema::{TableDef, ViewDef, STAGING_SUFFIX};
use crate::Result;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Drop staging tables left behind by an aborted run
pub async fn drop_stale_staging(pool: &SqlitePool) -> Result<usize> {
    // Exact suffix compare; `_` in the suffix is a LIKE wildcard
    let stale: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND length(name) > length(?1) AND substr(name, -length(?1)) = ?1",
    )
    .bind(STAGING_SUFFIX)
    .fetch_all(pool)
    .await?;

    for name in &stale {
        warn!(table = %name, "Dropping stale staging table from an aborted run");
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", name))
            .execute(pool)
            .await?;
    }

    Ok(stale.len())
}

/// Create an empty staging table for `def`, replacing any previous one
pub async fn create_staging_table(pool: &SqlitePool, def: &TableDef) -> Result<String> {
    let staging = def.staging_name();
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", staging))
        .execute(pool)
        .await?;
    sqlx::query(&def.create_sql(&staging)).execute(pool).await?;
    debug!(table = %staging, "Created staging table");
    Ok(staging)
}

/// Replace every live table in `defs` with its staged copy in one transaction
pub async fn swap_in_staged(pool: &SqlitePool, defs: &[TableDef], views: &[ViewDef]) -> Result<()> {
    let mut tx = pool.begin().await?;

    // Views are dropped first so renames never trip over a dangling view
    for view in views {
        sqlx::query(&format!("DROP VIEW IF EXISTS {}", view.name))
            .execute(&mut *tx)
            .await?;
    }

    for def in defs {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", def.name))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "ALTER TABLE {} RENAME TO {}",
            def.staging_name(),
            def.name
        ))
        .execute(&mut *tx)
        .await?;
        for index_sql in def.index_sql() {
            sqlx::query(&index_sql).execute(&mut *tx).await?;
        }
    }

    for view in views {
        sqlx::query(&view.create_sql()).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    info!(tables = defs.len(), views = views.len(), "Swapped rebuilt tables into place");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{table_exists, ColumnDefinition};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    fn numbers() -> TableDef {
        TableDef::new("numbers")
            .column(ColumnDefinition::new("n", "INTEGER").not_null())
            .primary_key(&["n"])
            .index("n", &["n"])
    }

    fn numbers_view() -> ViewDef {
        ViewDef {
            name: "v_numbers",
            select_sql: "SELECT n FROM numbers ORDER BY n DESC".to_string(),
        }
    }

    #[tokio::test]
    async fn test_swap_replaces_live_table() {
        let pool = memory_pool().await;
        let def = numbers();

        let staging = create_staging_table(&pool, &def).await.unwrap();
        sqlx::query(&format!("INSERT INTO {} (n) VALUES (1), (2)", staging))
            .execute(&pool)
            .await
            .unwrap();
        swap_in_staged(&pool, &[def.clone()], &[numbers_view()]).await.unwrap();

        let staging = create_staging_table(&pool, &def).await.unwrap();
        sqlx::query(&format!("INSERT INTO {} (n) VALUES (7)", staging))
            .execute(&pool)
            .await
            .unwrap();

        // Live table untouched until the swap
        let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM numbers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(live, 2);

        swap_in_staged(&pool, &[def.clone()], &[numbers_view()]).await.unwrap();

        let values: Vec<i64> = sqlx::query_scalar("SELECT n FROM v_numbers")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(values, vec![7]);
        assert!(!table_exists(&pool, "numbers__staging").await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_stale_staging() {
        let pool = memory_pool().await;
        create_staging_table(&pool, &numbers()).await.unwrap();

        assert_eq!(drop_stale_staging(&pool).await.unwrap(), 1);
        assert!(!table_exists(&pool, "numbers__staging").await.unwrap());
        assert_eq!(drop_stale_staging(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_drop_stale_staging_matches_suffix_exactly() {
        let pool = memory_pool().await;
        // Matches `%__staging` under LIKE since `_` is a wildcard there
        sqlx::query("CREATE TABLE backstaging (n INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        create_staging_table(&pool, &numbers()).await.unwrap();

        assert_eq!(drop_stale_staging(&pool).await.unwrap(), 1);
        assert!(table_exists(&pool, "backstaging").await.unwrap());
        assert!(!table_exists(&pool, "numbers__staging").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_swap_keeps_previous_tables() {
        let pool = memory_pool().await;
        let def = numbers();

        let staging = create_staging_table(&pool, &def).await.unwrap();
        sqlx::query(&format!("INSERT INTO {} (n) VALUES (1)", staging))
            .execute(&pool)
            .await
            .unwrap();
        swap_in_staged(&pool, &[def.clone()], &[]).await.unwrap();

        // No staging table exists, so the rename fails and the transaction rolls back
        let result = swap_in_staged(&pool, &[def], &[]).await;
        assert!(result.is_err());

        let live: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM numbers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(live, 1);
    }
}
