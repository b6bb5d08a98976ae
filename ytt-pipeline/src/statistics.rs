//! Run statistics
//!
//! One stats struct per stage, each with a `display_string` for the printed
//! QA report. The whole [`RunReport`] also serializes to JSON for
//! `--report-json`.

use crate::canonical::CanonicalStats;
use crate::dimensions::Dimensions;
use crate::momentum::rank_movers;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use uuid::Uuid;
use ytt_common::config::SharePopulation;
use ytt_common::db::{MonthPopulation, MoverDirection, TagEvent, TagMonthlyAggregate, TagMover};

/// Tags listed per section of the printed report
pub const REPORT_TOP_TAGS: usize = 10;

/// **SOURCE Stage Statistics**
///
/// Display: "N rows read, M undecodable rows skipped"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceStats {
    pub rows_read: u64,
    pub unreadable_rows: u64,
}

impl SourceStats {
    pub fn display_string(&self) -> String {
        format!(
            "{} rows read, {} undecodable rows skipped",
            self.rows_read, self.unreadable_rows
        )
    }
}

impl CanonicalStats {
    pub fn display_string(&self) -> String {
        format!(
            "{} raw rows, {} accepted, {} dropped ({} bad date, {} bad video id), {} countries",
            self.total,
            self.accepted,
            self.dropped(),
            self.rejected_bad_date,
            self.rejected_bad_video_id,
            self.distinct_countries
        )
    }
}

/// **DIMENSIONS Stage Statistics**
///
/// Display: "N videos, M channels; regional: X videos, Y channels"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionStats {
    pub videos: u64,
    pub channels: u64,
    pub regional_videos: u64,
    pub regional_channels: u64,
    pub channel_days: u64,
}

impl DimensionStats {
    pub fn from_dimensions(dims: &Dimensions) -> Self {
        Self {
            videos: dims.video_dims.len() as u64,
            channels: dims.channel_dims.len() as u64,
            regional_videos: dims.stickiness.len() as u64,
            regional_channels: dims.channel_alltime.len() as u64,
            channel_days: dims.channel_daily.len() as u64,
        }
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} videos, {} channels; regional: {} videos, {} channels, {} channel-days",
            self.videos, self.channels, self.regional_videos, self.regional_channels, self.channel_days
        )
    }
}

/// One tag line of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedTag {
    pub tag: String,
    pub distinct_videos: i64,
    pub value: Option<f64>,
}

/// **TAGS Stage Statistics**
///
/// Display: "N tag events, M unique tags, K months (first → last)"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagStats {
    pub events: u64,
    pub unique_tags: u64,
    pub months: u64,
    pub first_month: Option<NaiveDate>,
    pub last_month: Option<NaiveDate>,
    /// Months with regional records but no surviving tag
    pub untagged_months: u64,
    /// Top tags of the latest month by share
    pub top_latest: Vec<ReportedTag>,
    /// Top rising tags of the latest month by delta
    pub top_rising: Vec<ReportedTag>,
}

impl TagStats {
    pub fn collect(
        events: &[TagEvent],
        populations: &[MonthPopulation],
        aggregates: &[TagMonthlyAggregate],
        movers: &[TagMover],
    ) -> Self {
        let unique_tags = events.iter().map(|e| e.tag.as_str()).collect::<HashSet<_>>().len();
        let months: Vec<NaiveDate> = {
            let mut m: Vec<NaiveDate> = aggregates.iter().map(|a| a.month).collect();
            m.dedup();
            m
        };
        let last_month = months.last().copied();

        let top_latest = match last_month {
            Some(latest) => {
                let mut rows: Vec<&TagMonthlyAggregate> =
                    aggregates.iter().filter(|a| a.month == latest).collect();
                rows.sort_by(|a, b| {
                    b.video_share
                        .partial_cmp(&a.video_share)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.distinct_videos.cmp(&a.distinct_videos))
                        .then_with(|| a.tag.cmp(&b.tag))
                });
                rows.into_iter()
                    .take(REPORT_TOP_TAGS)
                    .map(|a| ReportedTag {
                        tag: a.tag.clone(),
                        distinct_videos: a.distinct_videos,
                        value: a.video_share,
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        let top_rising = match last_month {
            Some(latest) => rank_movers(movers, latest, MoverDirection::Rising)
                .into_iter()
                .take(REPORT_TOP_TAGS)
                .map(|m| ReportedTag {
                    distinct_videos: aggregates
                        .iter()
                        .find(|a| a.month == m.month && a.tag == m.tag)
                        .map_or(0, |a| a.distinct_videos),
                    tag: m.tag,
                    value: Some(m.delta),
                })
                .collect(),
            None => Vec::new(),
        };

        Self {
            events: events.len() as u64,
            unique_tags: unique_tags as u64,
            months: months.len() as u64,
            first_month: months.first().copied(),
            last_month,
            untagged_months: populations.iter().filter(|p| p.total_videos_tagged == 0).count() as u64,
            top_latest,
            top_rising,
        }
    }

    pub fn display_string(&self) -> String {
        match (self.first_month, self.last_month) {
            (Some(first), Some(last)) => format!(
                "{} tag events, {} unique tags, {} months ({} → {})",
                self.events, self.unique_tags, self.months, first, last
            ),
            _ => format!("{} tag events, no tag months", self.events),
        }
    }
}

/// QA report of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub region: String,
    pub share_population: SharePopulation,
    pub source_path: PathBuf,
    pub store_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source: SourceStats,
    pub canonical: CanonicalStats,
    pub dimensions: DimensionStats,
    pub tags: TagStats,
}

impl RunReport {
    /// Printable report, one line per entry
    pub fn display_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Run {} ({})", self.run_id, self.region),
            format!("Source: {}", self.source_path.display()),
            format!("Store: {}", self.store_path.display()),
            format!("Read: {}", self.source.display_string()),
            format!("Canonical: {}", self.canonical.display_string()),
        ];

        if !self.canonical.rejected_samples.is_empty() {
            lines.push(format!(
                "Sample rejected rows (up to {}):",
                crate::canonical::MAX_REJECTED_SAMPLES
            ));
            for s in &self.canonical.rejected_samples {
                lines.push(format!(
                    " - {} | {} | {} | {}",
                    s.video_id.as_deref().unwrap_or("<none>"),
                    s.trending_date.as_deref().unwrap_or("<none>"),
                    s.country.as_deref().unwrap_or("<none>"),
                    s.reason
                ));
            }
        }

        lines.push(format!("Dimensions: {}", self.dimensions.display_string()));
        lines.push(format!("Tags: {}", self.tags.display_string()));
        lines.push(format!(
            "Share population: {} ({} months without tags)",
            self.share_population.as_str(),
            self.tags.untagged_months
        ));

        if let Some(latest) = self.tags.last_month {
            lines.push(format!("Top tags in {}:", latest));
            for t in &self.tags.top_latest {
                lines.push(format!(
                    " - {} ({} videos, share {})",
                    t.tag,
                    t.distinct_videos,
                    format_value(t.value)
                ));
            }
            lines.push(format!("Rising tags in {}:", latest));
            for t in &self.tags.top_rising {
                lines.push(format!(" - {} (delta {})", t.tag, format_value(t.value)));
            }
        }

        lines.push(format!(
            "Duration: {:.1}s",
            (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
        ));
        lines
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn agg(m: &str, tag: &str, videos: i64, share: f64) -> TagMonthlyAggregate {
        TagMonthlyAggregate {
            month: month(m),
            tag: tag.to_string(),
            distinct_videos: videos,
            tag_rows: videos,
            total_videos_tagged: 10,
            total_videos_all: 20,
            video_share: Some(share),
            video_share_all: Some(share / 2.0),
        }
    }

    #[test]
    fn test_tag_stats_latest_month() {
        let aggregates = vec![
            agg("2024-01-01", "music", 2, 0.2),
            agg("2024-02-01", "music", 5, 0.5),
            agg("2024-02-01", "news", 1, 0.1),
        ];
        let movers = crate::momentum::compute_movers(&aggregates);
        let populations = vec![
            MonthPopulation { month: month("2024-01-01"), total_videos_all: 20, total_videos_tagged: 10 },
            MonthPopulation { month: month("2024-02-01"), total_videos_all: 20, total_videos_tagged: 10 },
            MonthPopulation { month: month("2024-03-01"), total_videos_all: 4, total_videos_tagged: 0 },
        ];

        let stats = TagStats::collect(&[], &populations, &aggregates, &movers);
        assert_eq!(stats.months, 2);
        assert_eq!(stats.first_month, Some(month("2024-01-01")));
        assert_eq!(stats.last_month, Some(month("2024-02-01")));
        assert_eq!(stats.untagged_months, 1);
        assert_eq!(stats.top_latest[0].tag, "music");
        assert_eq!(stats.top_rising[0].tag, "music");
        assert_eq!(stats.top_rising[0].distinct_videos, 5);
    }

    #[test]
    fn test_display_strings() {
        let source = SourceStats { rows_read: 10, unreadable_rows: 1 };
        assert_eq!(source.display_string(), "10 rows read, 1 undecodable rows skipped");

        let canonical = CanonicalStats {
            total: 10,
            rejected_bad_date: 2,
            rejected_bad_video_id: 1,
            accepted: 7,
            distinct_countries: 3,
            rejected_samples: Vec::new(),
        };
        assert_eq!(
            canonical.display_string(),
            "10 raw rows, 7 accepted, 3 dropped (2 bad date, 1 bad video id), 3 countries"
        );
        assert_eq!(TagStats::default().display_string(), "0 tag events, no tag months");
    }
}
