//! Canonical store builder
//!
//! Validates every raw record on the worker pool (input order preserved),
//! keeps the accepted records and tallies rejections for the run report.

use crate::error::{PipelineError, PipelineResult};
use crate::source::RawRecord;
use crate::validator::{is_valid_video_id, validate, Rejection};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use ytt_common::db::CanonicalRecord;

/// Rejected rows kept for the run report
pub const MAX_REJECTED_SAMPLES: usize = 8;

/// A rejected row as it appeared in the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSample {
    pub video_id: Option<String>,
    pub trending_date: Option<String>,
    pub country: Option<String>,
    pub reason: Rejection,
}

/// Validation tallies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStats {
    pub total: u64,
    pub rejected_bad_date: u64,
    pub rejected_bad_video_id: u64,
    pub accepted: u64,
    /// Distinct countries among accepted records (absent country excluded)
    pub distinct_countries: u64,
    pub rejected_samples: Vec<RejectedSample>,
}

impl CanonicalStats {
    /// Rows dropped between the raw import and the canonical table
    pub fn dropped(&self) -> u64 {
        self.total - self.accepted
    }
}

/// Output of the canonical build
#[derive(Debug, Clone)]
pub struct CanonicalOutput {
    pub records: Vec<CanonicalRecord>,
    pub stats: CanonicalStats,
}

/// Validate `raw` on `pool` and collect the canonical fact table
pub fn build_canonical(raw: &[RawRecord], pool: &ThreadPool) -> PipelineResult<CanonicalOutput> {
    let results: Vec<Result<CanonicalRecord, Rejection>> =
        pool.install(|| raw.par_iter().map(validate).collect());

    let mut stats = CanonicalStats {
        total: raw.len() as u64,
        ..Default::default()
    };
    let mut records = Vec::with_capacity(results.len());

    for (source, result) in raw.iter().zip(results) {
        match result {
            Ok(record) => records.push(record),
            Err(reason) => {
                match reason {
                    Rejection::BadDate => stats.rejected_bad_date += 1,
                    Rejection::BadVideoId => stats.rejected_bad_video_id += 1,
                }
                if stats.rejected_samples.len() < MAX_REJECTED_SAMPLES {
                    stats.rejected_samples.push(RejectedSample {
                        video_id: source.video_id.clone(),
                        trending_date: source.video_trending_date.clone(),
                        country: source.video_trending_country.clone(),
                        reason,
                    });
                }
            }
        }
    }

    stats.accepted = records.len() as u64;
    stats.distinct_countries = records
        .iter()
        .filter_map(|r| r.video_trending_country.as_deref())
        .collect::<HashSet<_>>()
        .len() as u64;

    check_post_condition(&records, &stats)?;

    if stats.accepted < stats.total {
        warn!(
            bad_date = stats.rejected_bad_date,
            bad_video_id = stats.rejected_bad_video_id,
            "Dropped {} invalid rows",
            stats.dropped()
        );
    }
    info!(
        total = stats.total,
        accepted = stats.accepted,
        countries = stats.distinct_countries,
        "Canonical fact table built"
    );

    Ok(CanonicalOutput { records, stats })
}

/// No accepted record may carry a malformed id; tallies must add up
fn check_post_condition(records: &[CanonicalRecord], stats: &CanonicalStats) -> PipelineResult<()> {
    if let Some(bad) = records.iter().find(|r| !is_valid_video_id(&r.video_id)) {
        return Err(PipelineError::Invariant(format!(
            "accepted record has malformed video id '{}'",
            bad.video_id
        )));
    }
    if stats.accepted + stats.rejected_bad_date + stats.rejected_bad_video_id != stats.total {
        return Err(PipelineError::Invariant(format!(
            "tallies do not add up: {} accepted + {} bad date + {} bad id != {} total",
            stats.accepted, stats.rejected_bad_date, stats.rejected_bad_video_id, stats.total
        )));
    }
    Ok(())
}
