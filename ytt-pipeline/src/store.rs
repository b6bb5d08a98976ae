//! Store writer
//!
//! Writes every rebuilt table into its staging copy, then swaps the whole
//! set in with one transaction. The run history row is appended after the
//! swap succeeds.

use crate::dimensions::Dimensions;
use crate::error::PipelineResult;
use crate::source::RawRecord;
use crate::statistics::RunReport;
use sqlx::query_builder::Separated;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use ytt_common::db::{
    channel_dim_table, channel_region_alltime_table, channel_region_daily_table, create_staging_table,
    rebuilt_tables, store_views, swap_in_staged, tag_events_table, tag_month_population_table,
    tag_monthly_table, tag_movers_monthly_table, trending_raw_table, trending_table, video_dim_table,
    video_reach_table, video_region_stickiness_table, CanonicalRecord, ChannelAllTimeRollup,
    ChannelDailyRollup, ChannelDimension, MonthPopulation, RegionalStickiness, TableDef, TagEvent,
    TagMonthlyAggregate, TagMover, VideoDimension, VideoReach, PIPELINE_RUNS,
};

/// Bound parameters per INSERT statement
const MAX_BIND_PARAMS: usize = 16_000;

/// Everything one run persists
pub struct StoreContents<'a> {
    pub raw: &'a [RawRecord],
    pub canonical: &'a [CanonicalRecord],
    pub dimensions: &'a Dimensions,
    pub tag_events: &'a [TagEvent],
    pub populations: &'a [MonthPopulation],
    pub tag_monthly: &'a [TagMonthlyAggregate],
    pub movers: &'a [TagMover],
}

/// A row that can be bound into a batched INSERT for its table
pub trait StagedRow {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>);
}

/// Stage every table, then swap them all in
pub async fn persist(pool: &SqlitePool, contents: &StoreContents<'_>, region: &str) -> PipelineResult<()> {
    let dims = contents.dimensions;

    write_staged(pool, &trending_raw_table(), contents.raw).await?;
    write_staged(pool, &trending_table(), contents.canonical).await?;
    write_staged(pool, &video_dim_table(), &dims.video_dims).await?;
    write_staged(pool, &video_reach_table(), &dims.video_reach).await?;
    write_staged(pool, &video_region_stickiness_table(), &dims.stickiness).await?;
    write_staged(pool, &channel_dim_table(), &dims.channel_dims).await?;
    write_staged(pool, &channel_region_daily_table(), &dims.channel_daily).await?;
    write_staged(pool, &channel_region_alltime_table(), &dims.channel_alltime).await?;
    write_staged(pool, &tag_events_table(), contents.tag_events).await?;
    write_staged(pool, &tag_month_population_table(), contents.populations).await?;
    write_staged(pool, &tag_monthly_table(), contents.tag_monthly).await?;
    write_staged(pool, &tag_movers_monthly_table(), contents.movers).await?;

    swap_in_staged(pool, &rebuilt_tables(), &store_views(region)).await?;
    Ok(())
}

/// Fill the staging copy of `def` with `rows`
pub async fn write_staged<T: StagedRow>(pool: &SqlitePool, def: &TableDef, rows: &[T]) -> PipelineResult<u64> {
    let staging = create_staging_table(pool, def).await?;
    let batch_size = (MAX_BIND_PARAMS / def.columns.len().max(1)).max(1);

    let mut tx = pool.begin().await?;
    for chunk in rows.chunks(batch_size) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(def.insert_prefix(&staging));
        builder.push_values(chunk, |mut row, item| item.bind_into(&mut row));
        builder.build().execute(&mut *tx).await?;
    }
    tx.commit().await?;

    debug!(table = %staging, rows = rows.len(), "Staged table written");
    Ok(rows.len() as u64)
}

/// Append the run history row
pub async fn record_run(pool: &SqlitePool, report: &RunReport) -> PipelineResult<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (run_id, region, share_population, started_at, finished_at, \
         total_raw, rejected_bad_date, rejected_bad_video_id, accepted, tag_events, tag_months) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        PIPELINE_RUNS
    ))
    .bind(report.run_id.to_string())
    .bind(&report.region)
    .bind(report.share_population.as_str())
    .bind(report.started_at)
    .bind(report.finished_at)
    .bind(report.canonical.total as i64)
    .bind(report.canonical.rejected_bad_date as i64)
    .bind(report.canonical.rejected_bad_video_id as i64)
    .bind(report.canonical.accepted as i64)
    .bind(report.tags.events as i64)
    .bind(report.tags.months as i64)
    .execute(pool)
    .await?;

    info!(run_id = %report.run_id, "Run recorded");
    Ok(())
}

impl StagedRow for RawRecord {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        for value in self.values() {
            row.push_bind(value);
        }
    }
}

impl StagedRow for CanonicalRecord {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.video_id.as_str())
            .push_bind(self.video_published_at)
            .push_bind(self.video_trending_date)
            .push_bind(self.video_trending_country.as_deref())
            .push_bind(self.channel_id.as_deref())
            .push_bind(self.video_title.as_deref())
            .push_bind(self.video_description.as_deref())
            .push_bind(self.video_default_thumbnail.as_deref())
            .push_bind(self.video_category_id)
            .push_bind(self.video_tags.as_deref())
            .push_bind(self.video_duration.as_deref())
            .push_bind(self.video_dimension.as_deref())
            .push_bind(self.video_definition.as_deref())
            .push_bind(self.video_licensed_content.as_deref())
            .push_bind(self.video_view_count)
            .push_bind(self.video_like_count)
            .push_bind(self.video_comment_count)
            .push_bind(self.channel_title.as_deref())
            .push_bind(self.channel_description.as_deref())
            .push_bind(self.channel_custom_url.as_deref())
            .push_bind(self.channel_published_at)
            .push_bind(self.channel_country.as_deref())
            .push_bind(self.channel_view_count)
            .push_bind(self.channel_subscriber_count)
            .push_bind(self.channel_have_hidden_subscribers.as_deref())
            .push_bind(self.channel_video_count)
            .push_bind(self.channel_localized_title.as_deref())
            .push_bind(self.channel_localized_description.as_deref());
    }
}

impl StagedRow for VideoDimension {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.video_id.as_str())
            .push_bind(self.video_title.as_deref())
            .push_bind(self.channel_id.as_deref())
            .push_bind(self.channel_title.as_deref())
            .push_bind(self.video_default_thumbnail.as_deref())
            .push_bind(self.video_category_id)
            .push_bind(self.video_duration.as_deref())
            .push_bind(self.video_definition.as_deref());
    }
}

impl StagedRow for VideoReach {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.video_id.as_str())
            .push_bind(self.countries_count);
    }
}

impl StagedRow for RegionalStickiness {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.video_id.as_str())
            .push_bind(self.region.as_str())
            .push_bind(self.days_trended)
            .push_bind(self.first_trending)
            .push_bind(self.last_trending);
    }
}

impl StagedRow for ChannelDimension {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.channel_id.as_str())
            .push_bind(self.channel_title.as_deref())
            .push_bind(self.channel_custom_url.as_deref())
            .push_bind(self.channel_country.as_deref());
    }
}

impl StagedRow for ChannelDailyRollup {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.date)
            .push_bind(self.channel_id.as_str())
            .push_bind(self.region.as_str())
            .push_bind(self.distinct_videos)
            .push_bind(self.appearances)
            .push_bind(self.sum_views)
            .push_bind(self.sum_likes)
            .push_bind(self.sum_comments);
    }
}

impl StagedRow for ChannelAllTimeRollup {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.channel_id.as_str())
            .push_bind(self.region.as_str())
            .push_bind(self.distinct_videos)
            .push_bind(self.days_active)
            .push_bind(self.appearances)
            .push_bind(self.first_date)
            .push_bind(self.last_date)
            .push_bind(self.sum_views)
            .push_bind(self.sum_likes)
            .push_bind(self.sum_comments);
    }
}

impl StagedRow for TagEvent {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.video_id.as_str())
            .push_bind(self.trending_date)
            .push_bind(self.month)
            .push_bind(self.tag.as_str());
    }
}

impl StagedRow for MonthPopulation {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.month)
            .push_bind(self.total_videos_all)
            .push_bind(self.total_videos_tagged);
    }
}

impl StagedRow for TagMonthlyAggregate {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.month)
            .push_bind(self.tag.as_str())
            .push_bind(self.distinct_videos)
            .push_bind(self.tag_rows)
            .push_bind(self.total_videos_tagged)
            .push_bind(self.total_videos_all)
            .push_bind(self.video_share)
            .push_bind(self.video_share_all);
    }
}

impl StagedRow for TagMover {
    fn bind_into<'args>(&'args self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.month)
            .push_bind(self.tag.as_str())
            .push_bind(self.share_now)
            .push_bind(self.share_prev)
            .push_bind(self.delta)
            .push_bind(self.lift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ytt_common::db::{init_store, table_exists};

    #[tokio::test]
    async fn test_write_staged_batches_rows() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_store(&dir.path().join("store.sqlite")).await.unwrap();
        let def = video_reach_table();

        let rows: Vec<VideoReach> = (0..9_000)
            .map(|i| VideoReach {
                video_id: format!("vid{:08}", i),
                countries_count: 1,
            })
            .collect();
        let written = write_staged(&pool, &def, &rows).await.unwrap();
        assert_eq!(written, 9_000);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM video_reach__staging")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 9_000);
        // Not visible until swapped
        assert!(!table_exists(&pool, "video_reach").await.unwrap());
    }

    #[tokio::test]
    async fn test_mover_nulls_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_store(&dir.path().join("store.sqlite")).await.unwrap();
        let month = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let rows = vec![TagMover {
            month,
            tag: "fresh".to_string(),
            share_now: 0.25,
            share_prev: None,
            delta: 0.25,
            lift: None,
        }];
        write_staged(&pool, &tag_movers_monthly_table(), &rows).await.unwrap();

        let stored: TagMover = sqlx::query_as("SELECT * FROM tag_movers_monthly__staging")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, rows[0]);
    }
}
