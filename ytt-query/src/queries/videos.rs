//! Video rankings and video detail

use super::{AdvancedMetric, VideoMetric};
use crate::error::{QueryError, QueryResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Countries listed in a video's spread
pub const COUNTRY_SPREAD_LIMIT: i64 = 20;

/// One fact-table row of a ranking, with its reach and stickiness
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct RankedVideo {
    pub video_id: String,
    pub video_title: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub video_category_id: Option<i64>,
    pub video_published_at: Option<DateTime<Utc>>,
    pub video_trending_date: NaiveDate,
    pub video_view_count: Option<i64>,
    pub video_like_count: Option<i64>,
    pub video_comment_count: Option<i64>,
    pub days_trended: Option<i64>,
    pub countries_count: Option<i64>,
}

const RANKED_SELECT: &str = "SELECT t.video_id, d.video_title, t.channel_id, d.channel_title, \
    d.video_default_thumbnail, t.video_category_id, t.video_published_at, t.video_trending_date, \
    t.video_view_count, t.video_like_count, t.video_comment_count, \
    s.days_trended, r.countries_count \
    FROM trending t \
    LEFT JOIN video_dim d ON d.video_id = t.video_id \
    LEFT JOIN video_region_stickiness s ON s.video_id = t.video_id AND s.region = t.video_trending_country \
    LEFT JOIN video_reach r ON r.video_id = t.video_id \
    WHERE t.video_trending_country = ? AND t.video_trending_date = ?";

async fn ranked(
    pool: &SqlitePool,
    region: &str,
    date: NaiveDate,
    order_column: &str,
    limit: i64,
) -> QueryResult<Vec<RankedVideo>> {
    let sql = format!(
        "{} ORDER BY {} DESC NULLS LAST, t.video_view_count DESC NULLS LAST, t.video_id LIMIT ?",
        RANKED_SELECT, order_column
    );
    let rows = sqlx::query_as(&sql)
        .bind(region)
        .bind(date)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Videos trending in `region` on `date`, by a per-day counter
pub async fn top_videos(
    pool: &SqlitePool,
    region: &str,
    date: NaiveDate,
    metric: VideoMetric,
    limit: i64,
) -> QueryResult<Vec<RankedVideo>> {
    ranked(pool, region, date, &format!("t.{}", metric.column()), limit).await
}

/// Videos trending in `region` on `date`, by stickiness or reach
pub async fn top_videos_advanced(
    pool: &SqlitePool,
    region: &str,
    date: NaiveDate,
    metric: AdvancedMetric,
    limit: i64,
) -> QueryResult<Vec<RankedVideo>> {
    let column = match metric {
        AdvancedMetric::Stickiness => "s.days_trended",
        AdvancedMetric::Reach => "r.countries_count",
    };
    ranked(pool, region, date, column, limit).await
}

/// Identity, reach and stickiness of one video
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VideoSummary {
    pub video_id: String,
    pub video_title: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub video_category_id: Option<i64>,
    pub video_duration: Option<String>,
    pub video_definition: Option<String>,
    pub countries_count: Option<i64>,
    pub stickiness_region: Option<String>,
    pub days_trended: Option<i64>,
    pub first_trending: Option<NaiveDate>,
    pub last_trending: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub video_view_count: Option<i64>,
    pub video_like_count: Option<i64>,
    pub video_comment_count: Option<i64>,
}

/// Distinct trending days of a video in one country
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CountrySpread {
    pub country: String,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoDetail {
    pub video: VideoSummary,
    pub country: String,
    pub history: Vec<HistoryPoint>,
    pub country_spread: Vec<CountrySpread>,
}

/// Everything known about one video, with its daily history in `country`
pub async fn video_detail(pool: &SqlitePool, video_id: &str, country: &str) -> QueryResult<VideoDetail> {
    let video: VideoSummary = sqlx::query_as(
        "SELECT d.video_id, d.video_title, d.channel_id, d.channel_title, d.video_default_thumbnail, \
         d.video_category_id, d.video_duration, d.video_definition, r.countries_count, \
         s.region AS stickiness_region, s.days_trended, s.first_trending, s.last_trending \
         FROM video_dim d \
         LEFT JOIN video_reach r ON r.video_id = d.video_id \
         LEFT JOIN video_region_stickiness s ON s.video_id = d.video_id \
         WHERE d.video_id = ?",
    )
    .bind(video_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| QueryError::NotFound(format!("video_id not found: {}", video_id)))?;

    let history = sqlx::query_as(
        "SELECT video_trending_date AS date, video_view_count, video_like_count, video_comment_count \
         FROM trending WHERE video_id = ? AND video_trending_country = ? \
         ORDER BY video_trending_date ASC",
    )
    .bind(video_id)
    .bind(country)
    .fetch_all(pool)
    .await?;

    let country_spread = sqlx::query_as(
        "SELECT video_trending_country AS country, COUNT(DISTINCT video_trending_date) AS days \
         FROM trending WHERE video_id = ? AND video_trending_country IS NOT NULL \
         GROUP BY video_trending_country ORDER BY days DESC, country ASC LIMIT ?",
    )
    .bind(video_id)
    .bind(COUNTRY_SPREAD_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(VideoDetail {
        video,
        country: country.to_string(),
        history,
        country_spread,
    })
}
