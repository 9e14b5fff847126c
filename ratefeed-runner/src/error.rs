use crate::config::ConfigError;
use chrono::NaiveDate;
use ratefeed_core::data::{SourceError, StoreError};
use thiserror::Error;

/// Errors that stop a pipeline run.
///
/// A single failed day inside a sweep is not one of these; it is recorded in
/// the sweep summary and the sweep carries on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
