//! Table Schema Definitions
//!
//! Single source of truth for the analytical store layout. Every rebuilt
//! table is listed in [`rebuilt_tables`] in the order the pipeline writes
//! them; views are recreated after each swap.

use crate::db::schema::{ColumnDefinition, TableDef, ViewDef};

pub const TRENDING_RAW: &str = "trending_raw";
pub const TRENDING: &str = "trending";
pub const VIDEO_DIM: &str = "video_dim";
pub const VIDEO_REACH: &str = "video_reach";
pub const VIDEO_REGION_STICKINESS: &str = "video_region_stickiness";
pub const CHANNEL_DIM: &str = "channel_dim";
pub const CHANNEL_REGION_DAILY: &str = "channel_region_daily";
pub const CHANNEL_REGION_ALLTIME: &str = "channel_region_alltime";
pub const TAG_EVENTS: &str = "tag_events";
pub const TAG_MONTH_POPULATION: &str = "tag_month_population";
pub const TAG_MONTHLY: &str = "tag_monthly";
pub const TAG_MOVERS_MONTHLY: &str = "tag_movers_monthly";
pub const PIPELINE_RUNS: &str = "pipeline_runs";

pub const V_AVAILABLE_DATES: &str = "v_available_dates";
pub const V_REGION_DATES: &str = "v_region_dates";
pub const V_TAG_MONTHS: &str = "v_tag_months";

/// Column headers of the source export, kept verbatim in `trending_raw`
pub const RAW_COLUMNS: &[&str] = &[
    "video_id",
    "video_published_at",
    "video_trending__date",
    "video_trending_country",
    "channel_id",
    "video_title",
    "video_description",
    "video_default_thumbnail",
    "video_category_id",
    "video_tags",
    "video_duration",
    "video_dimension",
    "video_definition",
    "video_licensed_content",
    "video_view_count",
    "video_like_count",
    "video_comment_count",
    "channel_title",
    "channel_description",
    "channel_custom_url",
    "channel_published_at",
    "channel_country",
    "channel_view_count",
    "channel_subscriber_count",
    "channel_have_hidden_subscribers",
    "channel_video_count",
    "channel_localized_title",
    "channel_localized_description",
];

fn text(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, "TEXT")
}

fn integer(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, "INTEGER")
}

fn date(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, "DATE")
}

fn real(name: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, "REAL")
}

/// Raw import: every export column as text
pub fn trending_raw_table() -> TableDef {
    RAW_COLUMNS
        .iter()
        .fold(TableDef::new(TRENDING_RAW), |def, name| def.column(text(name)))
}

/// Canonical fact table, one row per (video, country, trending date)
pub fn trending_table() -> TableDef {
    TableDef::new(TRENDING)
        .column(text("video_id").not_null())
        .column(ColumnDefinition::new("video_published_at", "TIMESTAMP"))
        .column(date("video_trending_date").not_null())
        .column(text("video_trending_country"))
        .column(text("channel_id"))
        .column(text("video_title"))
        .column(text("video_description"))
        .column(text("video_default_thumbnail"))
        .column(integer("video_category_id"))
        .column(text("video_tags"))
        .column(text("video_duration"))
        .column(text("video_dimension"))
        .column(text("video_definition"))
        .column(text("video_licensed_content"))
        .column(integer("video_view_count"))
        .column(integer("video_like_count"))
        .column(integer("video_comment_count"))
        .column(text("channel_title"))
        .column(text("channel_description"))
        .column(text("channel_custom_url"))
        .column(ColumnDefinition::new("channel_published_at", "TIMESTAMP"))
        .column(text("channel_country"))
        .column(integer("channel_view_count"))
        .column(integer("channel_subscriber_count"))
        .column(text("channel_have_hidden_subscribers"))
        .column(integer("channel_video_count"))
        .column(text("channel_localized_title"))
        .column(text("channel_localized_description"))
        .index("country_date", &["video_trending_country", "video_trending_date"])
        .index("video", &["video_id"])
        .index("channel", &["channel_id"])
}

pub fn video_dim_table() -> TableDef {
    TableDef::new(VIDEO_DIM)
        .column(text("video_id").not_null())
        .column(text("video_title"))
        .column(text("channel_id"))
        .column(text("channel_title"))
        .column(text("video_default_thumbnail"))
        .column(integer("video_category_id"))
        .column(text("video_duration"))
        .column(text("video_definition"))
        .primary_key(&["video_id"])
}

pub fn video_reach_table() -> TableDef {
    TableDef::new(VIDEO_REACH)
        .column(text("video_id").not_null())
        .column(integer("countries_count").not_null())
        .primary_key(&["video_id"])
}

pub fn video_region_stickiness_table() -> TableDef {
    TableDef::new(VIDEO_REGION_STICKINESS)
        .column(text("video_id").not_null())
        .column(text("region").not_null())
        .column(integer("days_trended").not_null())
        .column(date("first_trending").not_null())
        .column(date("last_trending").not_null())
        .primary_key(&["video_id"])
}

pub fn channel_dim_table() -> TableDef {
    TableDef::new(CHANNEL_DIM)
        .column(text("channel_id").not_null())
        .column(text("channel_title"))
        .column(text("channel_custom_url"))
        .column(text("channel_country"))
        .primary_key(&["channel_id"])
        .index("title", &["channel_title"])
}

pub fn channel_region_daily_table() -> TableDef {
    TableDef::new(CHANNEL_REGION_DAILY)
        .column(date("date").not_null())
        .column(text("channel_id").not_null())
        .column(text("region").not_null())
        .column(integer("distinct_videos").not_null())
        .column(integer("appearances").not_null())
        .column(integer("sum_views"))
        .column(integer("sum_likes"))
        .column(integer("sum_comments"))
        .primary_key(&["date", "channel_id"])
        .index("channel", &["channel_id", "date"])
}

pub fn channel_region_alltime_table() -> TableDef {
    TableDef::new(CHANNEL_REGION_ALLTIME)
        .column(text("channel_id").not_null())
        .column(text("region").not_null())
        .column(integer("distinct_videos").not_null())
        .column(integer("days_active").not_null())
        .column(integer("appearances").not_null())
        .column(date("first_date").not_null())
        .column(date("last_date").not_null())
        .column(integer("sum_views"))
        .column(integer("sum_likes"))
        .column(integer("sum_comments"))
        .primary_key(&["channel_id"])
}

pub fn tag_events_table() -> TableDef {
    TableDef::new(TAG_EVENTS)
        .column(text("video_id").not_null())
        .column(date("trending_date").not_null())
        .column(date("month").not_null())
        .column(text("tag").not_null())
        .primary_key(&["video_id", "trending_date", "tag"])
        .index("month_tag", &["month", "tag"])
}

pub fn tag_month_population_table() -> TableDef {
    TableDef::new(TAG_MONTH_POPULATION)
        .column(date("month").not_null())
        .column(integer("total_videos_all").not_null())
        .column(integer("total_videos_tagged").not_null())
        .primary_key(&["month"])
}

pub fn tag_monthly_table() -> TableDef {
    TableDef::new(TAG_MONTHLY)
        .column(date("month").not_null())
        .column(text("tag").not_null())
        .column(integer("distinct_videos").not_null())
        .column(integer("tag_rows").not_null())
        .column(integer("total_videos_tagged").not_null())
        .column(integer("total_videos_all").not_null())
        .column(real("video_share"))
        .column(real("video_share_all"))
        .primary_key(&["month", "tag"])
        .index("tag", &["tag", "month"])
}

pub fn tag_movers_monthly_table() -> TableDef {
    TableDef::new(TAG_MOVERS_MONTHLY)
        .column(date("month").not_null())
        .column(text("tag").not_null())
        .column(real("share_now").not_null())
        .column(real("share_prev"))
        .column(real("delta").not_null())
        .column(real("lift"))
        .primary_key(&["month", "tag"])
        .index("month_delta", &["month", "delta"])
}

/// Run history; appended to, never swapped
pub fn pipeline_runs_table() -> TableDef {
    TableDef::new(PIPELINE_RUNS)
        .column(text("run_id").not_null())
        .column(text("region").not_null())
        .column(text("share_population").not_null())
        .column(ColumnDefinition::new("started_at", "TIMESTAMP").not_null())
        .column(
            ColumnDefinition::new("finished_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
        )
        .column(integer("total_raw").not_null())
        .column(integer("rejected_bad_date").not_null())
        .column(integer("rejected_bad_video_id").not_null())
        .column(integer("accepted").not_null())
        .column(integer("tag_events").not_null())
        .column(integer("tag_months").not_null())
        .primary_key(&["run_id"])
}

/// Every table rebuilt by a pipeline run, in write order
pub fn rebuilt_tables() -> Vec<TableDef> {
    vec![
        trending_raw_table(),
        trending_table(),
        video_dim_table(),
        video_reach_table(),
        video_region_stickiness_table(),
        channel_dim_table(),
        channel_region_daily_table(),
        channel_region_alltime_table(),
        tag_events_table(),
        tag_month_population_table(),
        tag_monthly_table(),
        tag_movers_monthly_table(),
    ]
}

/// Views recreated after each swap
///
/// `v_region_dates` embeds the region the run was scoped to.
pub fn store_views(region: &str) -> Vec<ViewDef> {
    vec![
        ViewDef {
            name: V_AVAILABLE_DATES,
            select_sql: format!(
                "SELECT video_trending_country, \
                 min(video_trending_date) AS min_date, \
                 max(video_trending_date) AS max_date, \
                 count(*) AS row_count \
                 FROM {} GROUP BY video_trending_country ORDER BY video_trending_country",
                TRENDING
            ),
        },
        ViewDef {
            name: V_REGION_DATES,
            select_sql: format!(
                "SELECT DISTINCT video_trending_date FROM {} \
                 WHERE video_trending_country = {} ORDER BY video_trending_date DESC",
                TRENDING,
                sql_literal(region)
            ),
        },
        ViewDef {
            name: V_TAG_MONTHS,
            select_sql: format!(
                "SELECT DISTINCT month FROM {} ORDER BY month DESC",
                TAG_MONTHLY
            ),
        },
    ]
}

/// Quote a string as a SQL literal
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_table_has_every_export_column() {
        let def = trending_raw_table();
        assert_eq!(def.columns.len(), RAW_COLUMNS.len());
        assert!(def.columns.iter().all(|c| c.sql_type == "TEXT" && !c.not_null));
    }

    #[test]
    fn test_rebuilt_tables_have_unique_names() {
        let tables = rebuilt_tables();
        let mut names: Vec<_> = tables.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tables.len());
        assert!(!names.contains(&PIPELINE_RUNS));
    }

    #[test]
    fn test_tag_events_keyed_by_video_date_tag() {
        assert_eq!(tag_events_table().primary_key, vec!["video_id", "trending_date", "tag"]);
    }

    #[test]
    fn test_region_view_escapes_literal() {
        let views = store_views("Côte d'Ivoire");
        let region_view = views.iter().find(|v| v.name == V_REGION_DATES).unwrap();
        assert!(region_view.select_sql.contains("'Côte d''Ivoire'"));
    }
}
