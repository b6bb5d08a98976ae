//! Tag rankings, movers and per-tag drill-downs

use super::VideoMetric;
use crate::error::QueryResult;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use ytt_common::db::{MoverDirection, TagMonthlyAggregate, TagMover};

/// Stored tags are lowercase without a leading `#`
fn lookup_key(tag: &str) -> String {
    tag.trim().trim_start_matches('#').trim().to_lowercase()
}

/// Most widely shared tags of `month`
pub async fn top_tags(pool: &SqlitePool, month: NaiveDate, limit: i64) -> QueryResult<Vec<TagMonthlyAggregate>> {
    let rows = sqlx::query_as(
        "SELECT * FROM tag_monthly WHERE month = ? \
         ORDER BY video_share DESC NULLS LAST, distinct_videos DESC, tag ASC \
         LIMIT ?",
    )
    .bind(month)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One end of the month's mover ranking
///
/// Falling excludes tags with no share in the previous month.
pub async fn tag_movers(
    pool: &SqlitePool,
    month: NaiveDate,
    direction: MoverDirection,
    limit: i64,
) -> QueryResult<Vec<TagMover>> {
    let sql = match direction {
        MoverDirection::Rising => {
            "SELECT * FROM tag_movers_monthly WHERE month = ? \
             ORDER BY delta DESC, tag ASC LIMIT ?"
        }
        MoverDirection::Falling => {
            "SELECT * FROM tag_movers_monthly WHERE month = ? AND share_prev IS NOT NULL \
             ORDER BY delta ASC, tag ASC LIMIT ?"
        }
    };
    let rows = sqlx::query_as(sql)
        .bind(month)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every monthly row of one tag, oldest first
pub async fn tag_series(pool: &SqlitePool, tag: &str) -> QueryResult<Vec<TagMonthlyAggregate>> {
    let rows = sqlx::query_as("SELECT * FROM tag_monthly WHERE tag = ? ORDER BY month ASC")
        .bind(lookup_key(tag))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// A regional video carrying a tag during one month
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct TagVideo {
    pub video_id: String,
    pub video_title: Option<String>,
    pub channel_title: Option<String>,
    pub video_default_thumbnail: Option<String>,
    /// Trending days in the month that carried the tag
    pub days_tagged: i64,
    /// Best value of the ranking metric over those days
    pub best_value: Option<i64>,
}

/// Videos carrying `tag` in `month`, by their best metric value in the month
pub async fn tag_videos(
    pool: &SqlitePool,
    region: &str,
    tag: &str,
    month: NaiveDate,
    metric: VideoMetric,
    limit: i64,
) -> QueryResult<Vec<TagVideo>> {
    let sql = format!(
        "SELECT e.video_id, d.video_title, d.channel_title, d.video_default_thumbnail, \
         count(DISTINCT e.trending_date) AS days_tagged, max(t.{}) AS best_value \
         FROM tag_events e \
         JOIN trending t ON t.video_id = e.video_id \
           AND t.video_trending_date = e.trending_date \
           AND t.video_trending_country = ? \
         LEFT JOIN video_dim d ON d.video_id = e.video_id \
         WHERE e.tag = ? AND e.month = ? \
         GROUP BY e.video_id, d.video_title, d.channel_title, d.video_default_thumbnail \
         ORDER BY best_value DESC NULLS LAST, e.video_id ASC \
         LIMIT ?",
        metric.column()
    );
    let rows = sqlx::query_as(&sql)
        .bind(region)
        .bind(lookup_key(tag))
        .bind(month)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_matches_stored_form() {
        assert_eq!(lookup_key(" #Music "), "music");
        assert_eq!(lookup_key("lofi"), "lofi");
    }
}
