//! ytt-pipeline library interface
//!
//! Batch rebuild of the trending analytical store. Stages, leaf first:
//! validator → canonical → dimensions, and canonical → tags → tag_monthly →
//! momentum. The orchestrator in [`pipeline`] wires them together and the
//! [`store`] module persists the result.

pub mod canonical;
pub mod dimensions;
pub mod error;
pub mod momentum;
pub mod pipeline;
pub mod source;
pub mod statistics;
pub mod store;
pub mod tag_monthly;
pub mod tags;
pub mod validator;

pub use crate::error::{PipelineError, PipelineResult};
pub use crate::pipeline::{run_pipeline, PipelineOptions};
pub use crate::statistics::RunReport;
