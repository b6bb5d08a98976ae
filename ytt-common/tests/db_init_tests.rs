//! Store initialization and schema tests
//!
//! Builds every rebuilt table through the staging path against a scratch
//! store and checks the live layout matches the declared schema.

use ytt_common::config::DEFAULT_REGION;
use ytt_common::db::{
    create_staging_table, init_store, rebuilt_tables, store_views, swap_in_staged, table_columns,
    table_exists,
};

#[tokio::test]
async fn test_full_layout_swaps_in() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_store(&dir.path().join("store.sqlite")).await.unwrap();

    let tables = rebuilt_tables();
    for def in &tables {
        create_staging_table(&pool, def).await.unwrap();
    }
    swap_in_staged(&pool, &tables, &store_views(DEFAULT_REGION))
        .await
        .unwrap();

    for def in &tables {
        assert!(table_exists(&pool, def.name).await.unwrap(), "missing {}", def.name);
        assert!(!table_exists(&pool, &def.staging_name()).await.unwrap());

        let columns = table_columns(&pool, def.name).await.unwrap();
        let expected: Vec<String> = def.column_names().iter().map(|c| c.to_string()).collect();
        assert_eq!(columns, expected, "column mismatch in {}", def.name);
    }

    // Views are queryable over empty tables
    let months: Vec<String> = sqlx::query_scalar("SELECT month FROM v_tag_months")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert!(months.is_empty());
    let coverage: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM v_available_dates")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(coverage, 0);
}

#[tokio::test]
async fn test_swap_twice_keeps_single_copy() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_store(&dir.path().join("store.sqlite")).await.unwrap();
    let tables = rebuilt_tables();

    for _ in 0..2 {
        for def in &tables {
            create_staging_table(&pool, def).await.unwrap();
        }
        swap_in_staged(&pool, &tables, &store_views(DEFAULT_REGION))
            .await
            .unwrap();
    }

    let staged: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE '%__staging'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(staged, 0);
}
