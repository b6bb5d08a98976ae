//! Read contracts over the finished store
//!
//! Every function takes the read-only pool and typed arguments and returns
//! typed rows. Nothing here writes.

pub mod channels;
pub mod dates;
pub mod search;
pub mod tags;
pub mod videos;

pub use channels::{channel_detail, top_channels_alltime, top_channels_daily};
pub use dates::{latest_date, latest_tag_month, list_countries, list_dates, list_tag_months};
pub use search::{search_channels, search_videos};
pub use tags::{tag_movers, tag_series, tag_videos, top_tags};
pub use videos::{top_videos, top_videos_advanced, video_detail};

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Per-day counter used to rank videos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoMetric {
    Views,
    Likes,
    Comments,
}

impl VideoMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoMetric::Views => "views",
            VideoMetric::Likes => "likes",
            VideoMetric::Comments => "comments",
        }
    }

    /// Fact-table column holding the metric
    pub(crate) fn column(&self) -> &'static str {
        match self {
            VideoMetric::Views => "video_view_count",
            VideoMetric::Likes => "video_like_count",
            VideoMetric::Comments => "video_comment_count",
        }
    }
}

impl FromStr for VideoMetric {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "views" => Ok(VideoMetric::Views),
            "likes" => Ok(VideoMetric::Likes),
            "comments" => Ok(VideoMetric::Comments),
            _ => Err(QueryError::InvalidParameter(
                "metric must be views, likes or comments".to_string(),
            )),
        }
    }
}

/// Cross-day measure used by the advanced ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvancedMetric {
    /// Days trended in the region
    Stickiness,
    /// Distinct countries trended in
    Reach,
}

impl AdvancedMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvancedMetric::Stickiness => "stickiness",
            AdvancedMetric::Reach => "reach",
        }
    }
}

impl FromStr for AdvancedMetric {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stickiness" => Ok(AdvancedMetric::Stickiness),
            "reach" => Ok(AdvancedMetric::Reach),
            _ => Err(QueryError::InvalidParameter(
                "metric must be stickiness or reach".to_string(),
            )),
        }
    }
}

/// Search window: one regional date, or every date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Day,
    All,
}

impl FromStr for SearchScope {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(SearchScope::Day),
            "all" => Ok(SearchScope::All),
            _ => Err(QueryError::InvalidParameter(
                "scope must be day or all".to_string(),
            )),
        }
    }
}

/// Case-insensitive substring pattern for `lower(col) LIKE ? ESCAPE '\'`
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parsing() {
        assert_eq!("Likes".parse::<VideoMetric>().unwrap(), VideoMetric::Likes);
        assert_eq!("reach".parse::<AdvancedMetric>().unwrap(), AdvancedMetric::Reach);
        assert!("shares".parse::<VideoMetric>().is_err());
        assert!("day".parse::<SearchScope>().is_ok());
        assert!("week".parse::<SearchScope>().is_err());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern(" Cat "), "%cat%");
        assert_eq!(contains_pattern("100%_x"), "%100\\%\\_x%");
    }
}
