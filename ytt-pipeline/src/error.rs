//! Error types for ytt-pipeline
//!
//! Record-level rejections are not errors; they are counted in the run
//! report. Everything here aborts the run and leaves the previous store
//! tables untouched.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source export missing, unreadable or without data rows
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// CSV framing error outside of a single record
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Worker pool construction or a panicked blocking task
    #[error("Worker error: {0}")]
    Worker(String),

    /// Canonical post-condition violated
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// ytt-common error (config, store setup)
    #[error("Common error: {0}")]
    Common(#[from] ytt_common::Error),
}

/// Convenience result type
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PipelineError::SourceUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Worker(format!("Blocking task failed: {}", err))
    }
}

impl From<rayon::ThreadPoolBuildError> for PipelineError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        PipelineError::Worker(format!("Thread pool build failed: {}", err))
    }
}
