//! Monthly tag aggregation
//!
//! Buckets tag events by (month, tag) and computes each tag's share of the
//! month's video population. Two populations are tracked per month: every
//! regional video, and videos with at least one surviving tag.

use crate::tags::month_start;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;
use ytt_common::config::SharePopulation;
use ytt_common::db::{CanonicalRecord, MonthPopulation, TagEvent, TagMonthlyAggregate};

/// Decimal digits kept in stored shares
pub const SHARE_DECIMALS: i32 = 8;

/// Round a share to [`SHARE_DECIMALS`] digits
pub fn round_share(value: f64) -> f64 {
    let scale = 10f64.powi(SHARE_DECIMALS);
    (value * scale).round() / scale
}

/// `numerator / denominator`, rounded; absent for a zero denominator
pub fn share(numerator: i64, denominator: i64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(round_share(numerator as f64 / denominator as f64))
    }
}

/// Video populations of every month with regional records
///
/// Months with no surviving tag events are included with
/// `total_videos_tagged == 0`.
pub fn month_populations(
    records: &[CanonicalRecord],
    region: &str,
    events: &[TagEvent],
) -> Vec<MonthPopulation> {
    let mut all: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for r in records.iter().filter(|r| r.in_region(region)) {
        all.entry(month_start(r.video_trending_date))
            .or_default()
            .insert(r.video_id.as_str());
    }

    let mut tagged: HashMap<NaiveDate, HashSet<&str>> = HashMap::new();
    for e in events {
        tagged.entry(e.month).or_default().insert(e.video_id.as_str());
    }

    all.into_iter()
        .map(|(month, videos)| MonthPopulation {
            month,
            total_videos_all: videos.len() as i64,
            total_videos_tagged: tagged.get(&month).map_or(0, |v| v.len() as i64),
        })
        .collect()
}

/// Per (month, tag) aggregate, sorted by month then tag
pub fn aggregate_tags(
    events: &[TagEvent],
    populations: &[MonthPopulation],
    share_population: SharePopulation,
) -> Vec<TagMonthlyAggregate> {
    let mut buckets: BTreeMap<(NaiveDate, &str), (HashSet<&str>, i64)> = BTreeMap::new();
    for e in events {
        let bucket = buckets.entry((e.month, e.tag.as_str())).or_default();
        bucket.0.insert(e.video_id.as_str());
        bucket.1 += 1;
    }

    let by_month: HashMap<NaiveDate, &MonthPopulation> =
        populations.iter().map(|p| (p.month, p)).collect();

    let aggregates: Vec<TagMonthlyAggregate> = buckets
        .into_iter()
        .map(|((month, tag), (videos, tag_rows))| {
            let distinct_videos = videos.len() as i64;
            let (total_videos_tagged, total_videos_all) = by_month
                .get(&month)
                .map_or((0, 0), |p| (p.total_videos_tagged, p.total_videos_all));
            let denominator = match share_population {
                SharePopulation::Tagged => total_videos_tagged,
                SharePopulation::All => total_videos_all,
            };
            TagMonthlyAggregate {
                month,
                tag: tag.to_string(),
                distinct_videos,
                tag_rows,
                total_videos_tagged,
                total_videos_all,
                video_share: share(distinct_videos, denominator),
                video_share_all: share(distinct_videos, total_videos_all),
            }
        })
        .collect();

    info!(
        rows = aggregates.len(),
        months = populations.len(),
        population = share_population.as_str(),
        "Monthly tag aggregates built"
    );
    aggregates
}
