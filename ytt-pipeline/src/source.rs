//! Source export reader
//!
//! Streams the trending CSV export into [`RawRecord`]s. Every field stays
//! optional text; typing happens in the validator. A record the CSV layer
//! cannot decode is skipped and counted rather than aborting the run.

use crate::error::{PipelineError, PipelineResult};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// One row of the source export, exactly as read
///
/// Columns missing from the export header read as `None`, as do empty fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub video_id: Option<String>,
    pub video_published_at: Option<String>,
    #[serde(rename = "video_trending__date")]
    pub video_trending_date: Option<String>,
    pub video_trending_country: Option<String>,
    pub channel_id: Option<String>,
    pub video_title: Option<String>,
    pub video_description: Option<String>,
    pub video_default_thumbnail: Option<String>,
    pub video_category_id: Option<String>,
    pub video_tags: Option<String>,
    pub video_duration: Option<String>,
    pub video_dimension: Option<String>,
    pub video_definition: Option<String>,
    pub video_licensed_content: Option<String>,
    pub video_view_count: Option<String>,
    pub video_like_count: Option<String>,
    pub video_comment_count: Option<String>,
    pub channel_title: Option<String>,
    pub channel_description: Option<String>,
    pub channel_custom_url: Option<String>,
    pub channel_published_at: Option<String>,
    pub channel_country: Option<String>,
    pub channel_view_count: Option<String>,
    pub channel_subscriber_count: Option<String>,
    pub channel_have_hidden_subscribers: Option<String>,
    pub channel_video_count: Option<String>,
    pub channel_localized_title: Option<String>,
    pub channel_localized_description: Option<String>,
}

impl RawRecord {
    /// Field values in export column order (see `ytt_common::db::RAW_COLUMNS`)
    pub fn values(&self) -> [Option<&str>; 28] {
        [
            self.video_id.as_deref(),
            self.video_published_at.as_deref(),
            self.video_trending_date.as_deref(),
            self.video_trending_country.as_deref(),
            self.channel_id.as_deref(),
            self.video_title.as_deref(),
            self.video_description.as_deref(),
            self.video_default_thumbnail.as_deref(),
            self.video_category_id.as_deref(),
            self.video_tags.as_deref(),
            self.video_duration.as_deref(),
            self.video_dimension.as_deref(),
            self.video_definition.as_deref(),
            self.video_licensed_content.as_deref(),
            self.video_view_count.as_deref(),
            self.video_like_count.as_deref(),
            self.video_comment_count.as_deref(),
            self.channel_title.as_deref(),
            self.channel_description.as_deref(),
            self.channel_custom_url.as_deref(),
            self.channel_published_at.as_deref(),
            self.channel_country.as_deref(),
            self.channel_view_count.as_deref(),
            self.channel_subscriber_count.as_deref(),
            self.channel_have_hidden_subscribers.as_deref(),
            self.channel_video_count.as_deref(),
            self.channel_localized_title.as_deref(),
            self.channel_localized_description.as_deref(),
        ]
    }
}

/// Everything read from the source export
#[derive(Debug, Default)]
pub struct SourceData {
    pub records: Vec<RawRecord>,
    /// Rows the CSV layer could not decode (skipped)
    pub unreadable_rows: u64,
}

/// Read the export at `path`
///
/// Missing, unreadable or empty sources are fatal.
pub fn read_source(path: &Path) -> PipelineResult<SourceData> {
    if !path.is_file() {
        return Err(PipelineError::source_unavailable(path, "file not found"));
    }

    let reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(|e| PipelineError::source_unavailable(path, e.to_string()))?;

    info!("Reading source export: {}", path.display());
    read_records(reader, path)
}

/// Read an export from any reader (used by tests with in-memory CSV)
pub fn read_source_from<R: Read>(input: R, label: &Path) -> PipelineResult<SourceData> {
    let reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(input);
    read_records(reader, label)
}

fn read_records<R: Read>(mut reader: csv::Reader<R>, path: &Path) -> PipelineResult<SourceData> {
    let headers = reader
        .headers()
        .map_err(|e| PipelineError::source_unavailable(path, e.to_string()))?
        .clone();
    if !headers.iter().any(|h| h == "video_id") {
        return Err(PipelineError::source_unavailable(
            path,
            "header has no video_id column",
        ));
    }
    debug!(columns = headers.len(), "Source header read");

    let mut data = SourceData::default();
    for (index, result) in reader.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(record) => data.records.push(record),
            Err(e) if e.is_io_error() => {
                return Err(PipelineError::source_unavailable(path, e.to_string()));
            }
            Err(e) => {
                // Line numbers are 1-based and the header is line 1
                warn!(row = index + 2, error = %e, "Skipping undecodable source row");
                data.unreadable_rows += 1;
            }
        }
    }

    if data.records.is_empty() {
        return Err(PipelineError::source_unavailable(path, "no data rows"));
    }

    info!(
        rows = data.records.len(),
        skipped = data.unreadable_rows,
        "Source export loaded"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv_text: &str) -> PipelineResult<SourceData> {
        read_source_from(csv_text.as_bytes(), Path::new("memory.csv"))
    }

    #[test]
    fn test_reads_export_columns() {
        let data = read(
            "video_id,video_trending__date,video_trending_country,video_view_count\n\
             abcdefghijk,2024.10.12,United States,1500\n",
        )
        .unwrap();

        assert_eq!(data.records.len(), 1);
        let record = &data.records[0];
        assert_eq!(record.video_id.as_deref(), Some("abcdefghijk"));
        assert_eq!(record.video_trending_date.as_deref(), Some("2024.10.12"));
        assert_eq!(record.video_view_count.as_deref(), Some("1500"));
        // Missing column reads as absent
        assert_eq!(record.video_tags, None);
    }

    #[test]
    fn test_empty_field_reads_as_absent() {
        let data = read("video_id,channel_id,video_tags\nabcdefghijk,,\n").unwrap();
        assert_eq!(data.records[0].channel_id, None);
        assert_eq!(data.records[0].video_tags, None);
    }

    #[test]
    fn test_quoted_field_with_separators() {
        let data = read("video_id,video_tags\nabcdefghijk,\"a, b|c\"\n").unwrap();
        assert_eq!(data.records[0].video_tags.as_deref(), Some("a, b|c"));
    }

    #[test]
    fn test_header_only_is_unavailable() {
        let result = read("video_id,video_trending__date\n");
        assert!(matches!(result, Err(PipelineError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = read_source(Path::new("/nonexistent/trending.csv"));
        assert!(matches!(result, Err(PipelineError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_values_follow_export_order() {
        let record = RawRecord {
            video_id: Some("abcdefghijk".to_string()),
            channel_localized_description: Some("desc".to_string()),
            ..Default::default()
        };
        let values = record.values();
        assert_eq!(values.len(), ytt_common::db::RAW_COLUMNS.len());
        assert_eq!(values[0], Some("abcdefghijk"));
        assert_eq!(values[27], Some("desc"));
    }
}
