//! HTTP handlers for ytt-query
//!
//! Handlers parse raw query strings themselves so malformed values surface as
//! `QueryError::InvalidParameter` (400 with a JSON body) instead of axum's
//! plain-text extractor rejections.

pub mod channels;
pub mod coverage;
pub mod health;
pub mod search;
pub mod tags;
pub mod videos;

pub use channels::{channel_detail, channels_alltime, channels_daily};
pub use coverage::{countries, dates, tag_months};
pub use health::health_routes;
pub use search::{search_channels, search_videos};
pub use tags::{movers, series, tag_videos, top_tags};
pub use videos::{top, top_advanced, trending, video_detail};

use crate::error::{QueryError, QueryResult};
use crate::queries;
use crate::AppState;
use chrono::{Datelike, NaiveDate};

/// Parse `YYYY-MM-DD`
pub(crate) fn parse_date(raw: &str) -> QueryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| QueryError::InvalidParameter(format!("date must be YYYY-MM-DD, got {:?}", raw)))
}

/// Parse `YYYY-MM` or any date within the month, as the first of the month
pub(crate) fn parse_month(raw: &str) -> QueryResult<NaiveDate> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| QueryError::InvalidParameter(format!("month must be YYYY-MM, got {:?}", raw)))?;
    Ok(date.with_day(1).unwrap_or(date))
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Requested country, or the service region when omitted
pub(crate) fn country_or_region<'a>(state: &'a AppState, raw: Option<&'a str>) -> &'a str {
    present(raw).unwrap_or(state.region.as_str())
}

/// Requested date, or the latest date of `region` when omitted
pub(crate) async fn date_or_latest(
    state: &AppState,
    region: &str,
    raw: Option<&str>,
) -> QueryResult<NaiveDate> {
    match present(raw) {
        Some(raw) => parse_date(raw),
        None => queries::latest_date(&state.db, region).await,
    }
}

/// Requested month, or the latest tag month when omitted
pub(crate) async fn month_or_latest(state: &AppState, raw: Option<&str>) -> QueryResult<NaiveDate> {
    match present(raw) {
        Some(raw) => parse_month(raw),
        None => queries::latest_tag_month(&state.db).await,
    }
}

/// Parse an optional enum-like parameter, falling back to `default`
pub(crate) fn parse_or<T>(raw: Option<&str>, default: T) -> QueryResult<T>
where
    T: std::str::FromStr<Err = QueryError>,
{
    match present(raw) {
        Some(raw) => raw.parse(),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::VideoMetric;

    #[test]
    fn test_parse_month_forms() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(parse_month("2024-01").unwrap(), jan);
        assert_eq!(parse_month("2024-01-17").unwrap(), jan);
        assert!(parse_month("January").is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2024-02-30").is_err());
        assert_eq!(
            parse_date(" 2024-02-03 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
        );
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or(None, VideoMetric::Views).unwrap(), VideoMetric::Views);
        assert_eq!(parse_or(Some(""), VideoMetric::Views).unwrap(), VideoMetric::Views);
        assert_eq!(parse_or(Some("likes"), VideoMetric::Views).unwrap(), VideoMetric::Likes);
        assert!(parse_or(Some("shares"), VideoMetric::Views).is_err());
    }
}
