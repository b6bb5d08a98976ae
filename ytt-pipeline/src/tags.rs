//! Tag extraction and normalization
//!
//! Explodes the free-text tag field of every regional record into
//! normalized tags, drops junk, and deduplicates per (video, date, tag).

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::info;
use ytt_common::db::{CanonicalRecord, TagEvent};

/// Tag field separators used by the export
const TAG_SEPARATORS: &[char] = &[',', '|'];

/// Whole-field values the export uses for "no tags"
const PLACEHOLDER_FIELDS: &[&str] = &["[none]", "none", "nan", "null"];

const MIN_TAG_CHARS: usize = 2;
const MAX_TAG_CHARS: usize = 80;

/// Upper bound on normalization passes; real input settles in two
const MAX_NORMALIZE_PASSES: usize = 8;

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Normalize one tag piece
///
/// Lowercase, trim, strip leading `#`, collapse whitespace and strip one
/// layer of matching quotes, repeated until the text stops changing. The
/// result is therefore a fixpoint: `normalize_tag(normalize_tag(x)) ==
/// normalize_tag(x)`.
pub fn normalize_tag(piece: &str) -> String {
    let mut current = piece.to_string();
    for _ in 0..MAX_NORMALIZE_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(input: &str) -> String {
    let lowered = input.to_lowercase();
    let stripped = lowered.trim().trim_start_matches('#');
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    strip_quotes(&collapsed).to_string()
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// True when a normalized tag is worth keeping
pub fn is_acceptable_tag(tag: &str) -> bool {
    let chars = tag.chars().count();
    if !(MIN_TAG_CHARS..=MAX_TAG_CHARS).contains(&chars) {
        return false;
    }
    !(tag.starts_with("yt:") || tag.contains("http") || tag.contains("www.") || tag.contains('@'))
}

/// Normalized, accepted tags of one tag field, in field order (may repeat)
pub fn split_tags(field: &str) -> Vec<String> {
    let lowered = field.trim().to_lowercase();
    if lowered.is_empty() || PLACEHOLDER_FIELDS.contains(&lowered.as_str()) {
        return Vec::new();
    }
    field
        .split(TAG_SEPARATORS)
        .map(normalize_tag)
        .filter(|tag| is_acceptable_tag(tag))
        .collect()
}

fn record_events(record: &CanonicalRecord) -> Vec<TagEvent> {
    let Some(field) = record.video_tags.as_deref() else {
        return Vec::new();
    };
    let month = month_start(record.video_trending_date);
    split_tags(field)
        .into_iter()
        .map(|tag| TagEvent {
            video_id: record.video_id.clone(),
            trending_date: record.video_trending_date,
            month,
            tag,
        })
        .collect()
}

/// Tag events of every record in `region`, sorted and deduplicated
pub fn extract_tag_events(records: &[CanonicalRecord], region: &str, pool: &ThreadPool) -> Vec<TagEvent> {
    let mut events: Vec<TagEvent> = pool.install(|| {
        let mut events: Vec<TagEvent> = records
            .par_iter()
            .filter(|r| r.in_region(region))
            .flat_map_iter(record_events)
            .collect();
        events.par_sort_unstable();
        events
    });

    // Month follows from the date, so full-row dedup is (video, date, tag) dedup
    events.dedup();

    info!(events = events.len(), region = %region, "Tag events extracted");
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::test_support::record;

    const US: &str = "United States";

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn tagged(video_id: &str, date: &str, country: &str, tags: &str) -> CanonicalRecord {
        let mut r = record(video_id, date, country);
        r.video_tags = Some(tags.to_string());
        r
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize_tag("  #Music "), "music");
        assert_eq!(normalize_tag("Lo   Fi\tBeats"), "lo fi beats");
        assert_eq!(normalize_tag("\"quoted\""), "quoted");
        assert_eq!(normalize_tag("'single'"), "single");
        assert_eq!(normalize_tag("###tag"), "tag");
    }

    #[test]
    fn test_normalize_nested_layers() {
        assert_eq!(normalize_tag("\"#Fun\""), "fun");
        assert_eq!(normalize_tag("# \"Big  Game\" "), "big game");
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["\"#Fun\"", "  #A  B ", "'\"x y\"'", "#'#music'", "plain", "\"", "##"] {
            let once = normalize_tag(input);
            assert_eq!(normalize_tag(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_junk_filtered() {
        assert_eq!(split_tags("#Music, yt:cc=on, http://x.com, ok"), vec!["music", "ok"]);
        assert!(split_tags("a, @handle, www.site.com, https").is_empty());
        assert!(split_tags(&"x".repeat(81)).is_empty());
        assert_eq!(split_tags(&"x".repeat(80)).len(), 1);
    }

    #[test]
    fn test_pipe_separator() {
        assert_eq!(split_tags("news|sports , weather"), vec!["news", "sports", "weather"]);
    }

    #[test]
    fn test_placeholder_fields_are_empty() {
        assert!(split_tags("[None]").is_empty());
        assert!(split_tags(" nan ").is_empty());
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_case_variants_dedupe_to_one_event() {
        let records = vec![tagged("aaaaaaaaaaa", "2024-03-15", US, "Fun, fun, #FUN")];
        let events = extract_tag_events(&records, US, &pool());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].tag, "fun");
        assert_eq!(events[0].month.to_string(), "2024-03-01");
    }

    #[test]
    fn test_only_region_records_produce_events() {
        let records = vec![
            tagged("aaaaaaaaaaa", "2024-03-15", US, "music"),
            tagged("bbbbbbbbbbb", "2024-03-15", "Canada", "hockey"),
            record("ccccccccccc", "2024-03-15", US),
        ];
        let events = extract_tag_events(&records, US, &pool());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].video_id, "aaaaaaaaaaa");
    }

    #[test]
    fn test_same_tag_on_different_days_kept() {
        let records = vec![
            tagged("aaaaaaaaaaa", "2024-03-15", US, "music"),
            tagged("aaaaaaaaaaa", "2024-03-16", US, "music"),
            tagged("aaaaaaaaaaa", "2024-03-16", US, "Music"),
        ];
        assert_eq!(extract_tag_events(&records, US, &pool()).len(), 2);
    }
}
