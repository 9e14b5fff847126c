//! Single-unit runs: one file or one listing page, all or nothing.
//!
//! Unlike a sweep there is nothing to tolerate: if the unit fails, the error
//! goes straight back to the caller and the store is left untouched.

use crate::error::PipelineError;
use ratefeed_core::data::{
    merge_into, Diagnostic, DiagnosticSink, JsonStore, RateSource, TabularFile,
};
use ratefeed_core::{InstrumentCode, RateSeries, SourceUnit};
use std::path::Path;

/// Options for a single-unit run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Load the existing store and merge the new data into it before persisting.
    pub merge_existing: bool,
}

/// Outcome of a single-unit run.
#[derive(Debug)]
pub struct ImportSummary {
    /// Name of the source that produced the data.
    pub source: String,
    /// Dates the unit contributed.
    pub dates: usize,
    /// The series as persisted.
    pub series: RateSeries,
}

/// Run `unit` through `source` and persist the result.
pub fn run_single_unit(
    source: &dyn RateSource,
    unit: &SourceUnit,
    store: &JsonStore,
    opts: &ImportOptions,
    sink: &dyn DiagnosticSink,
) -> Result<ImportSummary, PipelineError> {
    let fragment = source.fetch_and_parse(unit, sink)?;
    let dates = fragment.len();

    let series = if opts.merge_existing {
        let mut existing = store.load()?;
        merge_into(&mut existing, fragment);
        existing
    } else {
        fragment
    };

    sink.emit(Diagnostic::UnitCompleted {
        unit: unit.clone(),
        dates,
    });
    store.persist_from(&series, source.name())?;

    Ok(ImportSummary {
        source: source.name().to_string(),
        dates,
        series,
    })
}

/// Import a local spreadsheet or CSV file, storing its values under `code`.
///
/// A missing file, an unsupported extension or missing required columns fail
/// before anything is written.
pub fn run_from_file(
    path: &Path,
    code: InstrumentCode,
    store: &JsonStore,
    opts: &ImportOptions,
    sink: &dyn DiagnosticSink,
) -> Result<ImportSummary, PipelineError> {
    let source = TabularFile::for_path(path, code)?;
    tracing::info!(path = %path.display(), source = source.name(), "importing file");
    run_single_unit(&source, &SourceUnit::File(path.to_path_buf()), store, opts, sink)
}
