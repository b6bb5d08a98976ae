//! Coverage lookups: available dates, countries and tag months

use crate::error::{QueryError, QueryResult};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

/// Per-country coverage of the fact table
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CountryCoverage {
    pub country: Option<String>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub row_count: i64,
}

/// Latest trending date with data for `region`
pub async fn latest_date(pool: &SqlitePool, region: &str) -> QueryResult<NaiveDate> {
    let latest: Option<NaiveDate> = sqlx::query_scalar(
        "SELECT max(video_trending_date) FROM trending WHERE video_trending_country = ?",
    )
    .bind(region)
    .fetch_one(pool)
    .await?;

    latest.ok_or_else(|| QueryError::NotFound(format!("No data found for region {}", region)))
}

/// Every trending date of `region`, newest first
pub async fn list_dates(pool: &SqlitePool, region: &str) -> QueryResult<Vec<NaiveDate>> {
    let dates = sqlx::query_scalar(
        "SELECT DISTINCT video_trending_date FROM trending \
         WHERE video_trending_country = ? ORDER BY video_trending_date DESC",
    )
    .bind(region)
    .fetch_all(pool)
    .await?;
    Ok(dates)
}

pub async fn list_countries(pool: &SqlitePool) -> QueryResult<Vec<CountryCoverage>> {
    let rows = sqlx::query_as(
        "SELECT video_trending_country AS country, min_date, max_date, row_count \
         FROM v_available_dates ORDER BY video_trending_country",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most recent month with tag aggregates
pub async fn latest_tag_month(pool: &SqlitePool) -> QueryResult<NaiveDate> {
    let latest: Option<NaiveDate> = sqlx::query_scalar("SELECT max(month) FROM tag_monthly")
        .fetch_one(pool)
        .await?;
    latest.ok_or_else(|| QueryError::NotFound("No tag months available".to_string()))
}

/// Months with tag aggregates, newest first
pub async fn list_tag_months(pool: &SqlitePool) -> QueryResult<Vec<NaiveDate>> {
    let months = sqlx::query_scalar("SELECT month FROM v_tag_months ORDER BY month DESC")
        .fetch_all(pool)
        .await?;
    Ok(months)
}
