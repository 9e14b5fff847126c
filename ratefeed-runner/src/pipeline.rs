//! Pipeline facade: config in, adapters and store wired up.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::import::{self, ImportOptions, ImportSummary};
use crate::sweep::{self, SweepOptions, SweepSummary, SweepWindow};
use chrono::NaiveDate;
use ratefeed_core::data::{CbrDailyXml, DiagnosticSink, JsonStore, KeyRateHtml, TracingSink};
use ratefeed_core::{RateBook, SourceUnit};
use std::path::Path;

/// Entry points for an embedding caller.
///
/// Diagnostics go to `tracing` unless another sink is supplied.
pub struct Pipeline {
    config: PipelineConfig,
    store: JsonStore,
    sink: Box<dyn DiagnosticSink>,
    merge_existing: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            store: JsonStore::new(&config.store_path),
            config,
            sink: Box::new(TracingSink),
            merge_existing: false,
        })
    }

    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Merge new data into the existing store instead of replacing it.
    pub fn with_merge_existing(mut self, merge: bool) -> Self {
        self.merge_existing = merge;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Sweep the daily XML feed over `start..=end`.
    pub fn run_remote_sweep(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SweepSummary, PipelineError> {
        self.run_sweep(SweepWindow::new(start, end)?)
    }

    /// Sweep the last `days` days up to and including `today`.
    pub fn run_trailing_sweep(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> Result<SweepSummary, PipelineError> {
        self.run_sweep(SweepWindow::trailing_days(days, today))
    }

    pub fn run_sweep(&self, window: SweepWindow) -> Result<SweepSummary, PipelineError> {
        let source = CbrDailyXml::new(&self.config.daily_url, self.config.request_timeout())?;
        let opts = SweepOptions {
            merge_existing: self.merge_existing,
            workers: self.config.workers,
        };
        sweep::run_remote_sweep(&source, &self.store, window, &opts, self.sink.as_ref())
    }

    /// Import a local spreadsheet or CSV file.
    pub fn run_from_file(&self, path: &Path) -> Result<ImportSummary, PipelineError> {
        import::run_from_file(
            path,
            self.config.key_rate_code()?,
            &self.store,
            &self.import_options(),
            self.sink.as_ref(),
        )
    }

    /// Fetch the key-rate listing page as a single unit.
    pub fn run_key_rate_page(&self) -> Result<ImportSummary, PipelineError> {
        let source = KeyRateHtml::new(self.config.key_rate_code()?, self.config.request_timeout())?;
        let unit = SourceUnit::Page(self.config.key_rate_url.clone());
        import::run_single_unit(
            &source,
            &unit,
            &self.store,
            &self.import_options(),
            self.sink.as_ref(),
        )
    }

    /// Load the persisted series for querying.
    pub fn open_book(&self) -> Result<RateBook, PipelineError> {
        Ok(RateBook::load(&self.store)?)
    }

    fn import_options(&self) -> ImportOptions {
        ImportOptions {
            merge_existing: self.merge_existing,
        }
    }
}
