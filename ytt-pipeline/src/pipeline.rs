//! Pipeline orchestrator
//!
//! One batch run: read the export, validate it into the canonical fact
//! table, build dimensions and the tag chain (events, monthly aggregates,
//! movers), then stage and swap everything into the store and append the
//! run history row.
//!
//! CPU stages run on a dedicated rayon pool inside `spawn_blocking` so the
//! tokio runtime only drives store I/O.

use crate::canonical::{build_canonical, CanonicalOutput};
use crate::dimensions::{build_dimensions, Dimensions};
use crate::error::PipelineResult;
use crate::momentum::compute_movers;
use crate::source::{read_source, SourceData};
use crate::statistics::{DimensionStats, RunReport, SourceStats, TagStats};
use crate::store::{persist, record_run, StoreContents};
use crate::tag_monthly::{aggregate_tags, month_populations};
use crate::tags::extract_tag_events;
use chrono::Utc;
use rayon::ThreadPoolBuilder;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;
use ytt_common::config::{Settings, SharePopulation};
use ytt_common::db::{drop_stale_staging, init_store, MonthPopulation, TagEvent, TagMonthlyAggregate, TagMover};

/// Inputs of one run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source_csv: PathBuf,
    pub store_path: PathBuf,
    pub region: String,
    pub threads: usize,
    pub share_population: SharePopulation,
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            source_csv: settings.source_csv.clone(),
            store_path: settings.store_path.clone(),
            region: settings.region.clone(),
            threads: settings.threads,
            share_population: settings.share_population,
        }
    }
}

/// Every table computed in memory before persistence
struct Computed {
    source: SourceData,
    canonical: CanonicalOutput,
    dimensions: Dimensions,
    tag_events: Vec<TagEvent>,
    populations: Vec<MonthPopulation>,
    tag_monthly: Vec<TagMonthlyAggregate>,
    movers: Vec<TagMover>,
}

/// Run the full rebuild
///
/// A missing or empty source fails before the store is opened. Any failure
/// after that leaves the previously swapped-in tables untouched.
pub async fn run_pipeline(options: &PipelineOptions) -> PipelineResult<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(
        run_id = %run_id,
        region = %options.region,
        threads = options.threads,
        population = options.share_population.as_str(),
        "Starting pipeline run"
    );

    let source_path = options.source_csv.clone();
    let source = tokio::task::spawn_blocking(move || read_source(&source_path)).await??;

    let region = options.region.clone();
    let threads = options.threads;
    let population = options.share_population;
    let computed =
        tokio::task::spawn_blocking(move || compute(source, &region, population, threads)).await??;

    let pool = init_store(&options.store_path).await?;
    let outcome: PipelineResult<RunReport> = async {
        let stale = drop_stale_staging(&pool).await?;
        if stale > 0 {
            warn!(tables = stale, "Cleared staging tables from an aborted run");
        }

        let contents = StoreContents {
            raw: &computed.source.records,
            canonical: &computed.canonical.records,
            dimensions: &computed.dimensions,
            tag_events: &computed.tag_events,
            populations: &computed.populations,
            tag_monthly: &computed.tag_monthly,
            movers: &computed.movers,
        };
        persist(&pool, &contents, &options.region).await?;

        let report = RunReport {
            run_id,
            region: options.region.clone(),
            share_population: options.share_population,
            source_path: options.source_csv.clone(),
            store_path: options.store_path.clone(),
            started_at,
            finished_at: Utc::now(),
            source: SourceStats {
                rows_read: computed.source.records.len() as u64,
                unreadable_rows: computed.source.unreadable_rows,
            },
            canonical: computed.canonical.stats.clone(),
            dimensions: DimensionStats::from_dimensions(&computed.dimensions),
            tags: TagStats::collect(
                &computed.tag_events,
                &computed.populations,
                &computed.tag_monthly,
                &computed.movers,
            ),
        };
        record_run(&pool, &report).await?;
        Ok(report)
    }
    .await;
    pool.close().await;

    if let Ok(report) = &outcome {
        info!(
            run_id = %report.run_id,
            accepted = report.canonical.accepted,
            tag_events = report.tags.events,
            "Pipeline run complete"
        );
    }
    outcome
}

fn compute(
    source: SourceData,
    region: &str,
    population: SharePopulation,
    threads: usize,
) -> PipelineResult<Computed> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("ytt-worker-{}", i))
        .build()?;

    let canonical = build_canonical(&source.records, &pool)?;
    let records = &canonical.records;

    let (dimensions, (tag_events, populations, tag_monthly, movers)) = pool.install(|| {
        rayon::join(
            || build_dimensions(records, region, &pool),
            || {
                let events = extract_tag_events(records, region, &pool);
                let populations = month_populations(records, region, &events);
                let monthly = aggregate_tags(&events, &populations, population);
                let movers = compute_movers(&monthly);
                (events, populations, monthly, movers)
            },
        )
    });

    Ok(Computed {
        source,
        canonical,
        dimensions,
        tag_events,
        populations,
        tag_monthly,
        movers,
    })
}
