//! Tag momentum
//!
//! Month-over-month change of every tag's share. The previous month is the
//! immediately preceding calendar month; a tag absent there has no
//! `share_prev` and its whole share counts as delta.

use chrono::{Months, NaiveDate};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::info;
use ytt_common::db::{MoverDirection, TagMonthlyAggregate, TagMover};

/// The calendar month before `month` (first-of-month in, first-of-month out)
pub fn previous_month(month: NaiveDate) -> Option<NaiveDate> {
    month.checked_sub_months(Months::new(1))
}

/// Compute movers for every (month, tag) with a share
///
/// Rows whose own share is absent (zero population) produce no mover.
pub fn compute_movers(aggregates: &[TagMonthlyAggregate]) -> Vec<TagMover> {
    let shares: HashMap<(NaiveDate, &str), Option<f64>> = aggregates
        .iter()
        .map(|a| ((a.month, a.tag.as_str()), a.video_share))
        .collect();

    let movers: Vec<TagMover> = aggregates
        .iter()
        .filter_map(|a| {
            let share_now = a.video_share?;
            let share_prev = previous_month(a.month)
                .and_then(|prev| shares.get(&(prev, a.tag.as_str())).copied())
                .flatten();
            Some(mover(a.month, &a.tag, share_now, share_prev))
        })
        .collect();

    info!(rows = movers.len(), "Tag movers computed");
    movers
}

fn mover(month: NaiveDate, tag: &str, share_now: f64, share_prev: Option<f64>) -> TagMover {
    let lift = match share_prev {
        Some(prev) if prev != 0.0 => Some(share_now / prev),
        _ => None,
    };
    TagMover {
        month,
        tag: tag.to_string(),
        share_now,
        share_prev,
        delta: share_now - share_prev.unwrap_or(0.0),
        lift,
    }
}

/// Movers of one month in ranking order
///
/// Rising: delta descending. Falling: delta ascending, tags new this month
/// excluded. Ties break on tag ascending.
pub fn rank_movers(movers: &[TagMover], month: NaiveDate, direction: MoverDirection) -> Vec<TagMover> {
    let mut ranked: Vec<TagMover> = movers
        .iter()
        .filter(|m| m.month == month)
        .filter(|m| direction == MoverDirection::Rising || m.share_prev.is_some())
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        let by_delta = match direction {
            MoverDirection::Rising => b.delta.partial_cmp(&a.delta),
            MoverDirection::Falling => a.delta.partial_cmp(&b.delta),
        };
        by_delta.unwrap_or(Ordering::Equal).then_with(|| a.tag.cmp(&b.tag))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn agg(m: &str, tag: &str, share: Option<f64>) -> TagMonthlyAggregate {
        TagMonthlyAggregate {
            month: month(m),
            tag: tag.to_string(),
            distinct_videos: 1,
            tag_rows: 1,
            total_videos_tagged: 1,
            total_videos_all: 1,
            video_share: share,
            video_share_all: share,
        }
    }

    fn find<'a>(movers: &'a [TagMover], m: &str, tag: &str) -> &'a TagMover {
        movers
            .iter()
            .find(|x| x.month == month(m) && x.tag == tag)
            .unwrap()
    }

    #[test]
    fn test_previous_month_crosses_year() {
        assert_eq!(previous_month(month("2024-01-01")), Some(month("2023-12-01")));
        assert_eq!(previous_month(month("2024-03-01")), Some(month("2024-02-01")));
    }

    #[test]
    fn test_consecutive_month_lift() {
        let movers = compute_movers(&[
            agg("2024-01-01", "music", Some(0.2)),
            agg("2024-02-01", "music", Some(0.3)),
        ]);
        let feb = find(&movers, "2024-02-01", "music");
        assert_eq!(feb.share_prev, Some(0.2));
        assert!((feb.delta - 0.1).abs() < 1e-12);
        assert!((feb.lift.unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_new_tag_delta_equals_share() {
        let movers = compute_movers(&[agg("2024-02-01", "new", Some(0.4))]);
        let m = find(&movers, "2024-02-01", "new");
        assert_eq!(m.share_prev, None);
        assert_eq!(m.delta, 0.4);
        assert_eq!(m.lift, None);
    }

    #[test]
    fn test_gap_month_is_not_previous() {
        let movers = compute_movers(&[
            agg("2024-01-01", "music", Some(0.2)),
            agg("2024-03-01", "music", Some(0.3)),
        ]);
        assert_eq!(find(&movers, "2024-03-01", "music").share_prev, None);
    }

    #[test]
    fn test_zero_previous_share_has_no_lift() {
        let movers = compute_movers(&[
            agg("2024-01-01", "quiet", Some(0.0)),
            agg("2024-02-01", "quiet", Some(0.1)),
        ]);
        let m = find(&movers, "2024-02-01", "quiet");
        assert_eq!(m.share_prev, Some(0.0));
        assert_eq!(m.lift, None);
        assert_eq!(m.delta, 0.1);
    }

    #[test]
    fn test_absent_share_skipped() {
        let movers = compute_movers(&[agg("2024-02-01", "x", None)]);
        assert!(movers.is_empty());
    }

    #[test]
    fn test_rising_and_falling_order() {
        let movers = compute_movers(&[
            agg("2024-01-01", "down", Some(0.5)),
            agg("2024-01-01", "flat", Some(0.2)),
            agg("2024-01-01", "up", Some(0.1)),
            agg("2024-02-01", "down", Some(0.1)),
            agg("2024-02-01", "flat", Some(0.2)),
            agg("2024-02-01", "up", Some(0.3)),
            agg("2024-02-01", "fresh", Some(0.2)),
        ]);

        let rising: Vec<String> = rank_movers(&movers, month("2024-02-01"), MoverDirection::Rising)
            .into_iter()
            .map(|m| m.tag)
            .collect();
        assert_eq!(rising, vec!["fresh", "up", "flat", "down"]);

        let falling: Vec<String> = rank_movers(&movers, month("2024-02-01"), MoverDirection::Falling)
            .into_iter()
            .map(|m| m.tag)
            .collect();
        assert_eq!(falling, vec!["down", "flat", "up"]);
    }

    #[test]
    fn test_ties_break_on_tag() {
        let movers = compute_movers(&[
            agg("2024-02-01", "beta", Some(0.2)),
            agg("2024-02-01", "alpha", Some(0.2)),
        ]);
        let rising: Vec<String> = rank_movers(&movers, month("2024-02-01"), MoverDirection::Rising)
            .into_iter()
            .map(|m| m.tag)
            .collect();
        assert_eq!(rising, vec!["alpha", "beta"]);
    }
}
