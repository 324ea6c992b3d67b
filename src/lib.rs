//! Cleaning, validation and KPI reporting for raw HR employee exports.
//!
//! The pipeline is a straight line of synchronous stages: load, normalize,
//! coerce, flag, deduplicate, then either write the cleaned table or
//! aggregate KPIs over it.

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineResult};
