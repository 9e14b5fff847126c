//! Ratefeed Runner: pipeline orchestration over ratefeed-core.
//!
//! This crate builds on `ratefeed-core` to provide:
//! - Pipeline configuration (TOML with defaults)
//! - Remote date sweeps, sequential or on a bounded worker pool, that
//!   tolerate per-day failures
//! - Single-unit imports (local files, key-rate page) that fail fast
//! - A `Pipeline` facade wiring adapters, store and diagnostics together

pub mod config;
pub mod error;
pub mod import;
pub mod pipeline;
pub mod sweep;

pub use config::{ConfigError, PipelineConfig};
pub use error::PipelineError;
pub use import::{run_from_file, run_single_unit, ImportOptions, ImportSummary};
pub use pipeline::Pipeline;
pub use sweep::{run_remote_sweep, SweepOptions, SweepSummary, SweepWindow};
