//! Record validator
//!
//! Turns one [`RawRecord`] into a [`CanonicalRecord`] or a [`Rejection`].
//! Only the video id and the trending date can reject a record; every other
//! field is cast best-effort and falls back to `None`.

use crate::source::RawRecord;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use ytt_common::db::CanonicalRecord;

static VIDEO_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern compiles"));

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ISO 8601 forms RFC 3339 does not cover: compact offsets, no seconds
const OFFSET_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Why a record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    BadDate,
    BadVideoId,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::BadDate => "bad_date",
            Rejection::BadVideoId => "bad_video_id",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `id` is a well-formed 11-character video id
pub fn is_valid_video_id(id: &str) -> bool {
    VIDEO_ID_PATTERN.is_match(id)
}

/// Validate one raw record
///
/// The id is checked first, so a record with both a bad id and a bad date is
/// rejected as `BadVideoId`.
pub fn validate(raw: &RawRecord) -> Result<CanonicalRecord, Rejection> {
    let video_id = match raw.video_id.as_deref() {
        Some(id) if is_valid_video_id(id) => id.to_string(),
        _ => return Err(Rejection::BadVideoId),
    };

    let video_trending_date = raw
        .video_trending_date
        .as_deref()
        .and_then(parse_trending_date)
        .ok_or(Rejection::BadDate)?;

    Ok(CanonicalRecord {
        video_id,
        video_published_at: raw.video_published_at.as_deref().and_then(parse_timestamp),
        video_trending_date,
        video_trending_country: text(&raw.video_trending_country),
        channel_id: text(&raw.channel_id),
        video_title: text(&raw.video_title),
        video_description: text(&raw.video_description),
        video_default_thumbnail: text(&raw.video_default_thumbnail),
        video_category_id: raw.video_category_id.as_deref().and_then(parse_integer),
        video_tags: text(&raw.video_tags),
        video_duration: text(&raw.video_duration),
        video_dimension: text(&raw.video_dimension),
        video_definition: text(&raw.video_definition),
        video_licensed_content: text(&raw.video_licensed_content),
        video_view_count: raw.video_view_count.as_deref().and_then(parse_counter),
        video_like_count: raw.video_like_count.as_deref().and_then(parse_counter),
        video_comment_count: raw.video_comment_count.as_deref().and_then(parse_counter),
        channel_title: text(&raw.channel_title),
        channel_description: text(&raw.channel_description),
        channel_custom_url: text(&raw.channel_custom_url),
        channel_published_at: raw.channel_published_at.as_deref().and_then(parse_timestamp),
        channel_country: text(&raw.channel_country),
        channel_view_count: raw.channel_view_count.as_deref().and_then(parse_counter),
        channel_subscriber_count: raw.channel_subscriber_count.as_deref().and_then(parse_counter),
        channel_have_hidden_subscribers: text(&raw.channel_have_hidden_subscribers),
        channel_video_count: raw.channel_video_count.as_deref().and_then(parse_counter),
        channel_localized_title: text(&raw.channel_localized_title),
        channel_localized_description: text(&raw.channel_localized_description),
    })
}

/// Parse a trending date
///
/// `YYYY-MM-DD` after replacing `.` with `-` (so `2024.10.12` parses), then
/// an ISO timestamp whose date part is taken as written.
pub fn parse_trending_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let dashed = trimmed.replace('.', "-");
    if let Ok(date) = NaiveDate::parse_from_str(&dashed, "%Y-%m-%d") {
        return Some(date);
    }

    parse_offset_timestamp(trimmed)
        .map(|ts| ts.date_naive())
        .or_else(|| parse_naive_timestamp(trimmed).map(|ts| ts.date()))
}

/// Timestamp carrying a UTC offset or a `Z` suffix
fn parse_offset_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts);
    }
    if let Some(ts) = OFFSET_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    {
        return Some(ts);
    }
    // `Z` on a form RFC 3339 rejects, e.g. minutes without seconds
    text.strip_suffix(['Z', 'z'])
        .and_then(parse_naive_timestamp)
        .map(|naive| naive.and_utc().fixed_offset())
}

fn parse_naive_timestamp(text: &str) -> Option<NaiveDateTime> {
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Parse a timestamp into UTC; naive timestamps and bare dates are taken as UTC
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(ts) = parse_offset_timestamp(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(naive) = parse_naive_timestamp(trimmed) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an integer; integral decimals such as `12.0` are accepted
pub fn parse_integer(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let float = trimmed.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// Parse a non-negative counter; negative or unparsable text is absent
pub fn parse_counter(input: &str) -> Option<i64> {
    parse_integer(input).filter(|value| *value >= 0)
}

fn text(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, date: &str) -> RawRecord {
        RawRecord {
            video_id: Some(id.to_string()),
            video_trending_date: Some(date.to_string()),
            video_trending_country: Some("United States".to_string()),
            ..Default::default()
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dotted_date_accepted() {
        let record = validate(&raw("abcdefghijk", "2024.10.12")).unwrap();
        assert_eq!(record.video_id, "abcdefghijk");
        assert_eq!(record.video_trending_date, ymd(2024, 10, 12));
    }

    #[test]
    fn test_timestamp_date_accepted() {
        let record = validate(&raw("abc_def-ghi", "2017-01-31T06:22:58Z")).unwrap();
        assert_eq!(record.video_trending_date, ymd(2017, 1, 31));
    }

    #[test]
    fn test_timestamp_date_taken_as_written() {
        // Late evening with a negative offset stays on the written date
        assert_eq!(
            parse_trending_date("2020-03-01T23:30:00-05:00"),
            Some(ymd(2020, 3, 1))
        );
        assert_eq!(parse_trending_date("2020-03-01 08:00:00"), Some(ymd(2020, 3, 1)));
        assert_eq!(parse_trending_date("  2020-03-01  "), Some(ymd(2020, 3, 1)));
    }

    #[test]
    fn test_compact_offset_timestamp_accepted() {
        assert_eq!(
            parse_trending_date("2017-01-31T06:22:58+0000"),
            Some(ymd(2017, 1, 31))
        );
    }

    #[test]
    fn test_zulu_timestamp_without_seconds_accepted() {
        assert_eq!(parse_trending_date("2017-01-31T06:22Z"), Some(ymd(2017, 1, 31)));
        assert_eq!(
            parse_timestamp("2017-01-31T06:22Z").map(|ts| ts.to_rfc3339()),
            Some("2017-01-31T06:22:00+00:00".to_string())
        );
    }

    #[test]
    fn test_naive_timestamp_without_seconds_accepted() {
        assert_eq!(parse_trending_date("2017-01-31T06:22"), Some(ymd(2017, 1, 31)));
        assert_eq!(parse_trending_date("2017-01-31 06:22"), Some(ymd(2017, 1, 31)));
    }

    #[test]
    fn test_video_id_pattern() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("a-b_c-d_e-f"));
        assert!(!is_valid_video_id("short"));
        assert!(!is_valid_video_id("dQw4w9WgXcQ1"));
        assert!(!is_valid_video_id("dQw4w9WgXc!"));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert_eq!(
            validate(&raw("abcdefghijk", "not-a-date")),
            Err(Rejection::BadDate)
        );
        assert_eq!(validate(&raw("abcdefghijk", "2024-02-30")), Err(Rejection::BadDate));

        let mut missing = raw("abcdefghijk", "");
        missing.video_trending_date = None;
        assert_eq!(validate(&missing), Err(Rejection::BadDate));
    }

    #[test]
    fn test_bad_id_rejected_before_date() {
        assert_eq!(validate(&raw("short", "2024-01-01")), Err(Rejection::BadVideoId));
        assert_eq!(validate(&raw("short", "not-a-date")), Err(Rejection::BadVideoId));
        assert_eq!(
            validate(&raw("abcdefghij!", "2024-01-01")),
            Err(Rejection::BadVideoId)
        );
        assert_eq!(
            validate(&raw("abcdefghijkl", "2024-01-01")),
            Err(Rejection::BadVideoId)
        );

        let mut missing = raw("", "2024-01-01");
        missing.video_id = None;
        assert_eq!(validate(&missing), Err(Rejection::BadVideoId));
    }

    #[test]
    fn test_counters_best_effort() {
        let mut input = raw("abcdefghijk", "2024-01-01");
        input.video_view_count = Some("1200".to_string());
        input.video_like_count = Some("-5".to_string());
        input.video_comment_count = Some("lots".to_string());
        input.channel_subscriber_count = Some("300.0".to_string());
        input.video_category_id = Some("24".to_string());

        let record = validate(&input).unwrap();
        assert_eq!(record.video_view_count, Some(1200));
        assert_eq!(record.video_like_count, None);
        assert_eq!(record.video_comment_count, None);
        assert_eq!(record.channel_subscriber_count, Some(300));
        assert_eq!(record.video_category_id, Some(24));
    }

    #[test]
    fn test_timestamps_normalized_to_utc() {
        let ts = parse_timestamp("2024-05-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T08:00:00+00:00");
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_validation_is_deterministic() {
        let input = raw("abcdefghijk", "2024.10.12");
        assert_eq!(validate(&input), validate(&input));
    }

    #[test]
    fn test_rejection_labels() {
        assert_eq!(Rejection::BadDate.as_str(), "bad_date");
        assert_eq!(Rejection::BadVideoId.to_string(), "bad_video_id");
    }
}
