//! Case-insensitive substring search over videos and channels
//!
//! Matching uses `lower(col) LIKE pattern` so non-ASCII titles fold the same
//! way the query does.

use super::{contains_pattern, SearchScope};
use crate::error::{QueryError, QueryResult};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VideoHit {
    pub video_id: String,
    pub video_title: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub best_views: Option<i64>,
    pub last_trending: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ChannelHit {
    pub channel_id: String,
    pub channel_title: Option<String>,
    pub channel_custom_url: Option<String>,
    pub distinct_videos: i64,
    pub sum_views: Option<i64>,
}

fn checked_pattern(query: &str) -> QueryResult<String> {
    if query.trim().is_empty() {
        return Err(QueryError::InvalidParameter("q must not be empty".to_string()));
    }
    Ok(contains_pattern(query))
}

fn day_of(scope: SearchScope, date: Option<NaiveDate>) -> QueryResult<Option<NaiveDate>> {
    match (scope, date) {
        (SearchScope::All, _) => Ok(None),
        (SearchScope::Day, Some(date)) => Ok(Some(date)),
        (SearchScope::Day, None) => Err(QueryError::InvalidParameter(
            "scope=day requires a date".to_string(),
        )),
    }
}

/// Regional videos whose title, channel name or id contains `query`
pub async fn search_videos(
    pool: &SqlitePool,
    region: &str,
    query: &str,
    scope: SearchScope,
    date: Option<NaiveDate>,
    limit: i64,
) -> QueryResult<Vec<VideoHit>> {
    let pattern = checked_pattern(query)?;
    let day = day_of(scope, date)?;

    let sql = format!(
        "SELECT t.video_id, d.video_title, d.channel_id, d.channel_title, d.video_default_thumbnail, \
         max(t.video_view_count) AS best_views, max(t.video_trending_date) AS last_trending \
         FROM trending t \
         JOIN video_dim d ON d.video_id = t.video_id \
         WHERE t.video_trending_country = ? {} \
           AND (lower(d.video_title) LIKE ? ESCAPE '\\' \
             OR lower(d.channel_title) LIKE ? ESCAPE '\\' \
             OR lower(t.video_id) LIKE ? ESCAPE '\\') \
         GROUP BY t.video_id, d.video_title, d.channel_id, d.channel_title, d.video_default_thumbnail \
         ORDER BY best_views DESC NULLS LAST, t.video_id ASC \
         LIMIT ?",
        if day.is_some() { "AND t.video_trending_date = ?" } else { "" }
    );

    let mut q = sqlx::query_as::<_, VideoHit>(&sql).bind(region);
    if let Some(day) = day {
        q = q.bind(day);
    }
    let rows = q
        .bind(pattern.as_str())
        .bind(pattern.as_str())
        .bind(pattern.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Regionally active channels whose name, custom URL or id contains `query`
pub async fn search_channels(
    pool: &SqlitePool,
    query: &str,
    scope: SearchScope,
    date: Option<NaiveDate>,
    limit: i64,
) -> QueryResult<Vec<ChannelHit>> {
    let pattern = checked_pattern(query)?;
    let day = day_of(scope, date)?;

    let (rollup, day_filter) = if day.is_some() {
        ("channel_region_daily", "r.date = ? AND")
    } else {
        ("channel_region_alltime", "")
    };
    let sql = format!(
        "SELECT r.channel_id, d.channel_title, d.channel_custom_url, r.distinct_videos, r.sum_views \
         FROM {} r \
         JOIN channel_dim d ON d.channel_id = r.channel_id \
         WHERE {} \
           (lower(d.channel_title) LIKE ? ESCAPE '\\' \
             OR lower(d.channel_custom_url) LIKE ? ESCAPE '\\' \
             OR lower(r.channel_id) LIKE ? ESCAPE '\\') \
         ORDER BY r.distinct_videos DESC, r.sum_views DESC NULLS LAST, r.channel_id ASC \
         LIMIT ?",
        rollup, day_filter
    );

    let mut q = sqlx::query_as::<_, ChannelHit>(&sql);
    if let Some(day) = day {
        q = q.bind(day);
    }
    let rows = q
        .bind(pattern.as_str())
        .bind(pattern.as_str())
        .bind(pattern.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_rejected() {
        assert!(matches!(checked_pattern("  "), Err(QueryError::InvalidParameter(_))));
        assert_eq!(checked_pattern("Lo-Fi").unwrap(), "%lo-fi%");
    }

    #[test]
    fn test_day_scope_needs_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(day_of(SearchScope::Day, Some(date)).unwrap(), Some(date));
        assert_eq!(day_of(SearchScope::All, Some(date)).unwrap(), None);
        assert!(day_of(SearchScope::Day, None).is_err());
    }
}
