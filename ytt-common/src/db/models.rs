//! Store row models
//!
//! One struct per table row. Column names match the store schema so the
//! query layer can read them with `sqlx::FromRow` directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Validated, typed fact-table row: one (video, country, trending date)
/// observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CanonicalRecord {
    pub video_id: String,
    pub video_published_at: Option<DateTime<Utc>>,
    pub video_trending_date: NaiveDate,
    pub video_trending_country: Option<String>,
    pub channel_id: Option<String>,
    pub video_title: Option<String>,
    pub video_description: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub video_category_id: Option<i64>,
    pub video_tags: Option<String>,
    pub video_duration: Option<String>,
    pub video_dimension: Option<String>,
    pub video_definition: Option<String>,
    pub video_licensed_content: Option<String>,
    pub video_view_count: Option<i64>,
    pub video_like_count: Option<i64>,
    pub video_comment_count: Option<i64>,
    pub channel_title: Option<String>,
    pub channel_description: Option<String>,
    pub channel_custom_url: Option<String>,
    pub channel_published_at: Option<DateTime<Utc>>,
    pub channel_country: Option<String>,
    pub channel_view_count: Option<i64>,
    pub channel_subscriber_count: Option<i64>,
    pub channel_have_hidden_subscribers: Option<String>,
    pub channel_video_count: Option<i64>,
    pub channel_localized_title: Option<String>,
    pub channel_localized_description: Option<String>,
}

impl CanonicalRecord {
    /// True when the observation belongs to `region`
    pub fn in_region(&self, region: &str) -> bool {
        self.video_trending_country.as_deref() == Some(region)
    }
}

/// Stable descriptive attributes of one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoDimension {
    pub video_id: String,
    pub video_title: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub video_category_id: Option<i64>,
    pub video_duration: Option<String>,
    pub video_definition: Option<String>,
}

/// Number of distinct countries a video trended in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoReach {
    pub video_id: String,
    pub countries_count: i64,
}

/// Trending days of one video within the configured region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegionalStickiness {
    pub video_id: String,
    pub region: String,
    pub days_trended: i64,
    pub first_trending: NaiveDate,
    pub last_trending: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChannelDimension {
    pub channel_id: String,
    pub channel_title: Option<String>,
    pub channel_custom_url: Option<String>,
    pub channel_country: Option<String>,
}

/// Per-day channel activity within the region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChannelDailyRollup {
    pub date: NaiveDate,
    pub channel_id: String,
    pub region: String,
    pub distinct_videos: i64,
    pub appearances: i64,
    pub sum_views: Option<i64>,
    pub sum_likes: Option<i64>,
    pub sum_comments: Option<i64>,
}

/// Channel activity within the region over every date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChannelAllTimeRollup {
    pub channel_id: String,
    pub region: String,
    pub distinct_videos: i64,
    pub days_active: i64,
    pub appearances: i64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub sum_views: Option<i64>,
    pub sum_likes: Option<i64>,
    pub sum_comments: Option<i64>,
}

/// One normalized tag carried by one video on one regional trending date
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagEvent {
    pub video_id: String,
    pub trending_date: NaiveDate,
    pub month: NaiveDate,
    pub tag: String,
}

/// Distinct-video populations of one calendar month in the region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthPopulation {
    pub month: NaiveDate,
    pub total_videos_all: i64,
    pub total_videos_tagged: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagMonthlyAggregate {
    pub month: NaiveDate,
    pub tag: String,
    pub distinct_videos: i64,
    /// Raw event count; diagnostics only
    pub tag_rows: i64,
    pub total_videos_tagged: i64,
    pub total_videos_all: i64,
    /// Share against the configured population (tagged-only by default)
    pub video_share: Option<f64>,
    /// Share against every regional video of the month
    pub video_share_all: Option<f64>,
}

/// Month-over-month change of one tag's share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagMover {
    pub month: NaiveDate,
    pub tag: String,
    pub share_now: f64,
    pub share_prev: Option<f64>,
    pub delta: f64,
    pub lift: Option<f64>,
}

/// Which end of a month's mover ranking to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoverDirection {
    /// Delta descending
    Rising,
    /// Delta ascending, tags new this month excluded
    Falling,
}

impl MoverDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoverDirection::Rising => "rising",
            MoverDirection::Falling => "falling",
        }
    }

    /// Parse `rising` / `falling` (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rising" => Some(MoverDirection::Rising),
            "falling" => Some(MoverDirection::Falling),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mover_direction_names() {
        assert_eq!(MoverDirection::from_name("Rising"), Some(MoverDirection::Rising));
        assert_eq!(MoverDirection::from_name(" falling "), Some(MoverDirection::Falling));
        assert_eq!(MoverDirection::from_name("up"), None);
        assert_eq!(MoverDirection::Falling.as_str(), "falling");
    }

    #[test]
    fn test_region_membership() {
        let json = serde_json::json!({
            "video_id": "abcdefghijk",
            "video_published_at": null,
            "video_trending_date": "2024-01-01",
            "video_trending_country": "Canada",
            "channel_id": null, "video_title": null, "video_description": null,
            "video_default_thumbnail": null, "video_category_id": null, "video_tags": null,
            "video_duration": null, "video_dimension": null, "video_definition": null,
            "video_licensed_content": null, "video_view_count": null, "video_like_count": null,
            "video_comment_count": null, "channel_title": null, "channel_description": null,
            "channel_custom_url": null, "channel_published_at": null, "channel_country": null,
            "channel_view_count": null, "channel_subscriber_count": null,
            "channel_have_hidden_subscribers": null, "channel_video_count": null,
            "channel_localized_title": null, "channel_localized_description": null
        });
        let record: CanonicalRecord = serde_json::from_value(json).unwrap();
        assert!(record.in_region("Canada"));
        assert!(!record.in_region("United States"));
    }
}
