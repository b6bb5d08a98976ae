//! Declarative table definitions
//!
//! Each table in the analytical store is described once in code; the
//! `CREATE TABLE`, index and column-list SQL used by the pipeline and the
//! schema checks in tests are all rendered from that description.
//!
//! # Usage
//!
//! ```rust,ignore
//! let def = TableDef::new("video_reach")
//!     .column(ColumnDefinition::new("video_id", "TEXT").not_null())
//!     .column(ColumnDefinition::new("countries_count", "INTEGER").not_null())
//!     .primary_key(&["video_id"]);
//!
//! sqlx::query(&def.create_sql(&def.staging_name())).execute(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};

/// Suffix for tables that are being rebuilt and not yet visible to readers
pub const STAGING_SUFFIX: &str = "__staging";

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "DATE")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// DEFAULT value
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            default_value: None,
        }
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }
}

/// Secondary index on a table, created after the table is swapped in
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
}

/// Complete description of one store table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: Vec<ColumnDefinition>,
    pub primary_key: Vec<&'static str>,
    pub indexes: Vec<IndexDefinition>,
}

impl TableDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: &[&'static str]) -> Self {
        self.primary_key = columns.to_vec();
        self
    }

    /// Add an index named `idx_<table>_<suffix>`
    pub fn index(mut self, suffix: &str, columns: &[&str]) -> Self {
        self.indexes.push(IndexDefinition {
            name: format!("idx_{}_{}", self.name, suffix),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Name of the table while it is being rebuilt
    pub fn staging_name(&self) -> String {
        format!("{}{}", self.name, STAGING_SUFFIX)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// `CREATE TABLE` statement for this definition under `table_name`
    pub fn create_sql(&self, table_name: &str) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(ColumnDefinition::to_sql).collect();
        if !self.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
        }
        format!("CREATE TABLE {} (\n    {}\n)", table_name, parts.join(",\n    "))
    }

    /// `INSERT INTO <table_name> (cols...) ` prefix for batched inserts
    pub fn insert_prefix(&self, table_name: &str) -> String {
        format!("INSERT INTO {} ({}) ", table_name, self.column_names().join(", "))
    }

    /// `CREATE INDEX` statements for the live table
    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|idx| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                    idx.name,
                    self.name,
                    idx.columns.join(", ")
                )
            })
            .collect()
    }
}

/// View over the live tables, recreated on every swap
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDef {
    pub name: &'static str,
    pub select_sql: String,
}

impl ViewDef {
    pub fn create_sql(&self) -> String {
        format!("CREATE VIEW {} AS {}", self.name, self.select_sql)
    }
}

/// Check if table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name = ?
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Column names of a table in declaration order (PRAGMA table_info)
pub async fn table_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<String>> {
    let query = format!("PRAGMA table_info({})", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<(i64, String)> = rows
        .iter()
        .map(|row| (row.get::<i64, _>("cid"), row.get::<String, _>("name")))
        .collect();
    columns.sort_by_key(|(cid, _)| *cid);

    Ok(columns.into_iter().map(|(_, name)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableDef {
        TableDef::new("tag_monthly")
            .column(ColumnDefinition::new("month", "DATE").not_null())
            .column(ColumnDefinition::new("tag", "TEXT").not_null())
            .column(ColumnDefinition::new("video_share", "REAL"))
            .primary_key(&["month", "tag"])
            .index("tag", &["tag", "month"])
    }

    #[test]
    fn test_create_sql_renders_constraints() {
        let sql = sample().create_sql("tag_monthly__staging");
        assert!(sql.starts_with("CREATE TABLE tag_monthly__staging ("));
        assert!(sql.contains("month DATE NOT NULL"));
        assert!(sql.contains("video_share REAL"));
        assert!(sql.contains("PRIMARY KEY (month, tag)"));
    }

    #[test]
    fn test_index_targets_live_table() {
        let def = sample();
        assert_eq!(
            def.index_sql(),
            vec!["CREATE INDEX IF NOT EXISTS idx_tag_monthly_tag ON tag_monthly (tag, month)".to_string()]
        );
    }

    #[test]
    fn test_insert_prefix_lists_columns_in_order() {
        assert_eq!(
            sample().insert_prefix("t"),
            "INSERT INTO t (month, tag, video_share) "
        );
    }

    #[test]
    fn test_default_value_rendered() {
        let col = ColumnDefinition::new("created_at", "TIMESTAMP")
            .not_null()
            .default("CURRENT_TIMESTAMP");
        assert_eq!(col.to_sql(), "created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP");
    }
}
