//! Remote date sweep: one unit per calendar day, partial-failure tolerant.
//!
//! Each day is fetched and parsed independently. A day that fails is
//! reported and skipped; the rest of the sweep carries on. Persist happens
//! exactly once, after every day has been processed.
//!
//! With `workers > 1` the days are fetched on a bounded rayon pool. Each
//! worker buffers its diagnostics and they are replayed in date order once
//! all fetches have joined, so the sink sees the same sequence either way.

use crate::config::ConfigError;
use crate::error::PipelineError;
use chrono::NaiveDate;
use rayon::prelude::*;
use ratefeed_core::data::{
    merge_into, CollectingSink, Diagnostic, DiagnosticSink, JsonStore, RateSource, SourceError,
};
use ratefeed_core::{RateSeries, SourceUnit};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl SweepWindow {
    /// Fails with [`PipelineError::InvalidRange`] when `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// `[today - days, today]`.
    pub fn trailing_days(days: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(chrono::Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every day in the window, ascending.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

/// Options for a remote sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOptions {
    /// Load the existing store and merge the sweep into it before persisting.
    pub merge_existing: bool,
    /// Concurrent fetches. 1 means sequential.
    pub workers: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            merge_existing: false,
            workers: 1,
        }
    }
}

/// Outcome of a sweep.
#[derive(Debug)]
pub struct SweepSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failed days with their errors, ascending by date.
    pub errors: Vec<(NaiveDate, SourceError)>,
    /// The series as persisted.
    pub series: RateSeries,
}

impl SweepSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Sweep `source` over every day of `window` and persist the result to `store`.
///
/// Per-day failures never abort the sweep. A sweep in which every day fails
/// still persists (an empty series, or the prior data when merging).
pub fn run_remote_sweep(
    source: &dyn RateSource,
    store: &JsonStore,
    window: SweepWindow,
    opts: &SweepOptions,
    sink: &dyn DiagnosticSink,
) -> Result<SweepSummary, PipelineError> {
    let mut series = if opts.merge_existing {
        store.load()?
    } else {
        RateSeries::new()
    };

    let days: Vec<NaiveDate> = window.days().collect();
    let total = days.len();
    tracing::info!(
        source = source.name(),
        start = %window.start(),
        end = %window.end(),
        days = total,
        workers = opts.workers,
        "starting sweep"
    );

    let mut succeeded = 0;
    let mut errors: Vec<(NaiveDate, SourceError)> = Vec::new();
    let mut record = |date: NaiveDate, result: Result<RateSeries, SourceError>| {
        let unit = SourceUnit::Day(date);
        match result {
            Ok(fragment) => {
                let dates = merge_into(&mut series, fragment);
                sink.emit(Diagnostic::UnitCompleted { unit, dates });
                succeeded += 1;
            }
            Err(e) => {
                sink.emit(Diagnostic::UnitFailed {
                    unit,
                    error: e.to_string(),
                });
                errors.push((date, e));
            }
        }
    };

    if opts.workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.workers)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("worker pool: {e}")))?;

        // Collect keeps input order, so outcomes come back ascending by date.
        let outcomes: Vec<(NaiveDate, Result<RateSeries, SourceError>, CollectingSink)> =
            pool.install(|| {
                days.par_iter()
                    .map(|&date| {
                        let buffer = CollectingSink::new();
                        let result = source.fetch_and_parse(&SourceUnit::Day(date), &buffer);
                        (date, result, buffer)
                    })
                    .collect()
            });

        for (date, result, buffer) in outcomes {
            buffer.replay_into(sink);
            record(date, result);
        }
    } else {
        for date in days {
            let result = source.fetch_and_parse(&SourceUnit::Day(date), sink);
            record(date, result);
        }
    }

    let failed = errors.len();
    store.persist_from(&series, source.name())?;

    tracing::info!(
        source = source.name(),
        succeeded,
        failed,
        stored_days = series.len(),
        "sweep complete"
    );

    Ok(SweepSummary {
        total,
        succeeded,
        failed,
        errors,
        series,
    })
}
