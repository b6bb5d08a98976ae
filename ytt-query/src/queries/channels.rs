//! Channel rankings and channel detail
//!
//! Channel rollups are scoped to the region the pipeline ran for.

use crate::error::{QueryError, QueryResult};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use ytt_common::db::{ChannelAllTimeRollup, ChannelDimension};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ChannelDayRank {
    pub date: NaiveDate,
    pub channel_id: String,
    pub channel_title: Option<String>,
    pub distinct_videos: i64,
    pub appearances: i64,
    pub sum_views: Option<i64>,
    pub sum_likes: Option<i64>,
    pub sum_comments: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ChannelAllTimeRank {
    pub channel_id: String,
    pub channel_title: Option<String>,
    pub distinct_videos: i64,
    pub days_active: i64,
    pub appearances: i64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub sum_views: Option<i64>,
    pub sum_likes: Option<i64>,
    pub sum_comments: Option<i64>,
}

/// Channels active on `date`: distinct videos, then summed views
pub async fn top_channels_daily(pool: &SqlitePool, date: NaiveDate, limit: i64) -> QueryResult<Vec<ChannelDayRank>> {
    let rows = sqlx::query_as(
        "SELECT c.date, c.channel_id, d.channel_title, c.distinct_videos, c.appearances, \
         c.sum_views, c.sum_likes, c.sum_comments \
         FROM channel_region_daily c \
         LEFT JOIN channel_dim d ON d.channel_id = c.channel_id \
         WHERE c.date = ? \
         ORDER BY c.distinct_videos DESC, c.sum_views DESC NULLS LAST, c.channel_id ASC \
         LIMIT ?",
    )
    .bind(date)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Channels over every date: distinct videos, then days active
pub async fn top_channels_alltime(pool: &SqlitePool, limit: i64) -> QueryResult<Vec<ChannelAllTimeRank>> {
    let rows = sqlx::query_as(
        "SELECT a.channel_id, d.channel_title, a.distinct_videos, a.days_active, a.appearances, \
         a.first_date, a.last_date, a.sum_views, a.sum_likes, a.sum_comments \
         FROM channel_region_alltime a \
         LEFT JOIN channel_dim d ON d.channel_id = a.channel_id \
         ORDER BY a.distinct_videos DESC, a.days_active DESC, a.channel_id ASC \
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One of a channel's regional videos
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ChannelVideo {
    pub video_id: String,
    pub video_title: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub days_trended: i64,
    pub first_trending: NaiveDate,
    pub last_trending: NaiveDate,
    /// Highest regional view count observed
    pub peak_views: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDetail {
    pub channel: ChannelDimension,
    /// Absent when the channel never trended in the region
    pub alltime: Option<ChannelAllTimeRollup>,
    pub videos: Vec<ChannelVideo>,
}

/// Channel identity, regional rollup and its videos by days trended
pub async fn channel_detail(pool: &SqlitePool, channel_id: &str, limit: i64) -> QueryResult<ChannelDetail> {
    let channel: ChannelDimension = sqlx::query_as("SELECT * FROM channel_dim WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| QueryError::NotFound(format!("channel_id not found: {}", channel_id)))?;

    let alltime = sqlx::query_as("SELECT * FROM channel_region_alltime WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_optional(pool)
        .await?;

    let videos = sqlx::query_as(
        "SELECT d.video_id, d.video_title, d.video_default_thumbnail, \
         s.days_trended, s.first_trending, s.last_trending, \
         (SELECT max(t.video_view_count) FROM trending t \
          WHERE t.video_id = d.video_id AND t.video_trending_country = s.region) AS peak_views \
         FROM video_dim d \
         JOIN video_region_stickiness s ON s.video_id = d.video_id \
         WHERE d.channel_id = ? \
         ORDER BY s.days_trended DESC, s.last_trending DESC, d.video_id ASC \
         LIMIT ?",
    )
    .bind(channel_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ChannelDetail {
        channel,
        alltime,
        videos,
    })
}
