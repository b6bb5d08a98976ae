//! Dimension builder
//!
//! Per-entity rollups over the canonical fact table. Each table is a pure
//! grouping with no dependency on the others, so all six are built
//! concurrently on the worker pool. Descriptive attributes come from the
//! first record seen for the entity; output rows are sorted by key.

use chrono::NaiveDate;
use rayon::ThreadPool;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::info;
use ytt_common::db::{
    CanonicalRecord, ChannelAllTimeRollup, ChannelDailyRollup, ChannelDimension, RegionalStickiness,
    VideoDimension, VideoReach,
};

/// Every dimension table of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dimensions {
    pub video_dims: Vec<VideoDimension>,
    pub video_reach: Vec<VideoReach>,
    pub stickiness: Vec<RegionalStickiness>,
    pub channel_dims: Vec<ChannelDimension>,
    pub channel_daily: Vec<ChannelDailyRollup>,
    pub channel_alltime: Vec<ChannelAllTimeRollup>,
}

/// Build all dimension tables for `region`
pub fn build_dimensions(records: &[CanonicalRecord], region: &str, pool: &ThreadPool) -> Dimensions {
    let ((video_dims, video_reach), (stickiness, (channel_dims, (channel_daily, channel_alltime)))) =
        pool.install(|| {
            rayon::join(
                || rayon::join(|| video_dimensions(records), || video_reach(records)),
                || {
                    rayon::join(
                        || regional_stickiness(records, region),
                        || {
                            rayon::join(
                                || channel_dimensions(records),
                                || {
                                    rayon::join(
                                        || channel_daily_rollups(records, region),
                                        || channel_alltime_rollups(records, region),
                                    )
                                },
                            )
                        },
                    )
                },
            )
        });

    info!(
        videos = video_dims.len(),
        regional_videos = stickiness.len(),
        channels = channel_dims.len(),
        regional_channels = channel_alltime.len(),
        "Dimension tables built"
    );

    Dimensions {
        video_dims,
        video_reach,
        stickiness,
        channel_dims,
        channel_daily,
        channel_alltime,
    }
}

pub fn video_dimensions(records: &[CanonicalRecord]) -> Vec<VideoDimension> {
    let mut dims: BTreeMap<&str, VideoDimension> = BTreeMap::new();
    for r in records {
        dims.entry(r.video_id.as_str()).or_insert_with(|| VideoDimension {
            video_id: r.video_id.clone(),
            video_title: r.video_title.clone(),
            channel_id: r.channel_id.clone(),
            channel_title: r.channel_title.clone(),
            video_default_thumbnail: r.video_default_thumbnail.clone(),
            video_category_id: r.video_category_id,
            video_duration: r.video_duration.clone(),
            video_definition: r.video_definition.clone(),
        });
    }
    dims.into_values().collect()
}

/// Distinct countries per video; records without a country do not count
pub fn video_reach(records: &[CanonicalRecord]) -> Vec<VideoReach> {
    let mut countries: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for r in records {
        let entry = countries.entry(r.video_id.as_str()).or_default();
        if let Some(country) = r.video_trending_country.as_deref() {
            entry.insert(country);
        }
    }
    countries
        .into_iter()
        .map(|(video_id, set)| VideoReach {
            video_id: video_id.to_string(),
            countries_count: set.len() as i64,
        })
        .collect()
}

pub fn regional_stickiness(records: &[CanonicalRecord], region: &str) -> Vec<RegionalStickiness> {
    let mut dates: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.in_region(region)) {
        dates
            .entry(r.video_id.as_str())
            .or_default()
            .insert(r.video_trending_date);
    }
    dates
        .into_iter()
        .filter_map(|(video_id, days)| {
            let first = *days.first()?;
            let last = *days.last()?;
            Some(RegionalStickiness {
                video_id: video_id.to_string(),
                region: region.to_string(),
                days_trended: days.len() as i64,
                first_trending: first,
                last_trending: last,
            })
        })
        .collect()
}

/// One row per channel id; records without a channel id are skipped
pub fn channel_dimensions(records: &[CanonicalRecord]) -> Vec<ChannelDimension> {
    let mut dims: BTreeMap<&str, ChannelDimension> = BTreeMap::new();
    for r in records {
        let Some(channel_id) = r.channel_id.as_deref() else {
            continue;
        };
        dims.entry(channel_id).or_insert_with(|| ChannelDimension {
            channel_id: channel_id.to_string(),
            channel_title: r.channel_title.clone(),
            channel_custom_url: r.channel_custom_url.clone(),
            channel_country: r.channel_country.clone(),
        });
    }
    dims.into_values().collect()
}

/// Sums of optional counters: absent values are ignored, all-absent stays absent
#[derive(Debug, Default, Clone, Copy)]
struct CounterSums {
    views: Option<i64>,
    likes: Option<i64>,
    comments: Option<i64>,
}

impl CounterSums {
    fn add(&mut self, r: &CanonicalRecord) {
        add_counter(&mut self.views, r.video_view_count);
        add_counter(&mut self.likes, r.video_like_count);
        add_counter(&mut self.comments, r.video_comment_count);
    }
}

fn add_counter(sum: &mut Option<i64>, value: Option<i64>) {
    if let Some(v) = value {
        *sum = Some(sum.unwrap_or(0).saturating_add(v));
    }
}

#[derive(Default)]
struct DailyAcc<'a> {
    videos: HashSet<&'a str>,
    appearances: i64,
    sums: CounterSums,
}

pub fn channel_daily_rollups(records: &[CanonicalRecord], region: &str) -> Vec<ChannelDailyRollup> {
    let mut groups: BTreeMap<(NaiveDate, &str), DailyAcc> = BTreeMap::new();
    for r in records.iter().filter(|r| r.in_region(region)) {
        let Some(channel_id) = r.channel_id.as_deref() else {
            continue;
        };
        let acc = groups.entry((r.video_trending_date, channel_id)).or_default();
        acc.videos.insert(r.video_id.as_str());
        acc.appearances += 1;
        acc.sums.add(r);
    }
    groups
        .into_iter()
        .map(|((date, channel_id), acc)| ChannelDailyRollup {
            date,
            channel_id: channel_id.to_string(),
            region: region.to_string(),
            distinct_videos: acc.videos.len() as i64,
            appearances: acc.appearances,
            sum_views: acc.sums.views,
            sum_likes: acc.sums.likes,
            sum_comments: acc.sums.comments,
        })
        .collect()
}

#[derive(Default)]
struct AllTimeAcc<'a> {
    videos: HashSet<&'a str>,
    dates: BTreeSet<NaiveDate>,
    appearances: i64,
    sums: CounterSums,
}

pub fn channel_alltime_rollups(records: &[CanonicalRecord], region: &str) -> Vec<ChannelAllTimeRollup> {
    let mut groups: BTreeMap<&str, AllTimeAcc> = BTreeMap::new();
    for r in records.iter().filter(|r| r.in_region(region)) {
        let Some(channel_id) = r.channel_id.as_deref() else {
            continue;
        };
        let acc = groups.entry(channel_id).or_default();
        acc.videos.insert(r.video_id.as_str());
        acc.dates.insert(r.video_trending_date);
        acc.appearances += 1;
        acc.sums.add(r);
    }
    groups
        .into_iter()
        .filter_map(|(channel_id, acc)| {
            let first_date = *acc.dates.first()?;
            let last_date = *acc.dates.last()?;
            Some(ChannelAllTimeRollup {
                channel_id: channel_id.to_string(),
                region: region.to_string(),
                distinct_videos: acc.videos.len() as i64,
                days_active: acc.dates.len() as i64,
                appearances: acc.appearances,
                first_date,
                last_date,
                sum_views: acc.sums.views,
                sum_likes: acc.sums.likes,
                sum_comments: acc.sums.comments,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal canonical record for rollup tests
    pub fn record(video_id: &str, date: &str, country: &str) -> CanonicalRecord {
        CanonicalRecord {
            video_id: video_id.to_string(),
            video_published_at: None,
            video_trending_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            video_trending_country: Some(country.to_string()),
            channel_id: None,
            video_title: None,
            video_description: None,
            video_default_thumbnail: None,
            video_category_id: None,
            video_tags: None,
            video_duration: None,
            video_dimension: None,
            video_definition: None,
            video_licensed_content: None,
            video_view_count: None,
            video_like_count: None,
            video_comment_count: None,
            channel_title: None,
            channel_description: None,
            channel_custom_url: None,
            channel_published_at: None,
            channel_country: None,
            channel_view_count: None,
            channel_subscriber_count: None,
            channel_have_hidden_subscribers: None,
            channel_video_count: None,
            channel_localized_title: None,
            channel_localized_description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    const US: &str = "United States";

    fn with_channel(mut r: CanonicalRecord, channel: &str, views: Option<i64>) -> CanonicalRecord {
        r.channel_id = Some(channel.to_string());
        r.channel_title = Some(format!("{} title", channel));
        r.video_view_count = views;
        r
    }

    #[test]
    fn test_reach_counts_distinct_countries() {
        let records = vec![
            record("aaaaaaaaaaa", "2024-01-01", US),
            record("aaaaaaaaaaa", "2024-01-02", US),
            record("aaaaaaaaaaa", "2024-01-01", "Canada"),
            record("aaaaaaaaaaa", "2024-01-01", "Japan"),
            record("bbbbbbbbbbb", "2024-01-01", US),
        ];
        let reach = video_reach(&records);
        assert_eq!(reach[0].video_id, "aaaaaaaaaaa");
        assert_eq!(reach[0].countries_count, 3);
        assert_eq!(reach[1].countries_count, 1);
    }

    #[test]
    fn test_video_dim_first_seen_wins() {
        let mut first = record("aaaaaaaaaaa", "2024-01-02", US);
        first.video_title = Some("First".to_string());
        first.video_duration = Some("PT1M".to_string());
        let mut second = record("aaaaaaaaaaa", "2024-01-01", US);
        second.video_title = Some("Second".to_string());
        second.video_duration = Some("PT9M".to_string());

        let dims = video_dimensions(&[first, second]);
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].video_title.as_deref(), Some("First"));
        assert_eq!(dims[0].video_duration.as_deref(), Some("PT1M"));
    }

    #[test]
    fn test_stickiness_counts_distinct_regional_days() {
        let records = vec![
            record("aaaaaaaaaaa", "2024-01-03", US),
            record("aaaaaaaaaaa", "2024-01-01", US),
            record("aaaaaaaaaaa", "2024-01-01", US),
            record("aaaaaaaaaaa", "2024-02-01", "Canada"),
            record("ccccccccccc", "2024-02-01", "Canada"),
        ];
        let sticky = regional_stickiness(&records, US);
        assert_eq!(sticky.len(), 1);
        assert_eq!(sticky[0].days_trended, 2);
        assert_eq!(sticky[0].first_trending.to_string(), "2024-01-01");
        assert_eq!(sticky[0].last_trending.to_string(), "2024-01-03");
        assert_eq!(sticky[0].region, US);
    }

    #[test]
    fn test_channel_rows_skip_missing_channel() {
        let records = vec![
            with_channel(record("aaaaaaaaaaa", "2024-01-01", US), "UC1", Some(10)),
            record("bbbbbbbbbbb", "2024-01-01", US),
        ];
        assert_eq!(channel_dimensions(&records).len(), 1);
        assert_eq!(channel_daily_rollups(&records, US).len(), 1);
        assert_eq!(channel_alltime_rollups(&records, US).len(), 1);
    }

    #[test]
    fn test_channel_sums_ignore_absent() {
        let records = vec![
            with_channel(record("aaaaaaaaaaa", "2024-01-01", US), "UC1", Some(10)),
            with_channel(record("aaaaaaaaaaa", "2024-01-02", US), "UC1", None),
            with_channel(record("bbbbbbbbbbb", "2024-01-02", US), "UC1", Some(5)),
            with_channel(record("ccccccccccc", "2024-01-02", US), "UC2", None),
        ];

        let daily = channel_daily_rollups(&records, US);
        assert_eq!(daily.len(), 3);
        let uc1_day2 = daily
            .iter()
            .find(|d| d.channel_id == "UC1" && d.date.to_string() == "2024-01-02")
            .unwrap();
        assert_eq!(uc1_day2.distinct_videos, 2);
        assert_eq!(uc1_day2.appearances, 2);
        assert_eq!(uc1_day2.sum_views, Some(5));

        let alltime = channel_alltime_rollups(&records, US);
        assert_eq!(alltime[0].channel_id, "UC1");
        assert_eq!(alltime[0].distinct_videos, 2);
        assert_eq!(alltime[0].days_active, 2);
        assert_eq!(alltime[0].appearances, 3);
        assert_eq!(alltime[0].sum_views, Some(15));
        assert_eq!(alltime[1].channel_id, "UC2");
        assert_eq!(alltime[1].sum_views, None);
    }

    #[test]
    fn test_build_dimensions_sorted_and_complete() {
        let records = vec![
            with_channel(record("bbbbbbbbbbb", "2024-01-01", US), "UC2", Some(1)),
            with_channel(record("aaaaaaaaaaa", "2024-01-01", "Canada"), "UC1", Some(1)),
        ];
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let dims = build_dimensions(&records, US, &pool);

        let ids: Vec<&str> = dims.video_dims.iter().map(|d| d.video_id.as_str()).collect();
        assert_eq!(ids, vec!["aaaaaaaaaaa", "bbbbbbbbbbb"]);
        assert_eq!(dims.channel_dims.len(), 2);
        assert_eq!(dims.stickiness.len(), 1);
        assert_eq!(dims.channel_alltime.len(), 1);
    }
}
