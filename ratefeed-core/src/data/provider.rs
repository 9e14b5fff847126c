//! Rate source trait and structured error types.
//!
//! The RateSource trait abstracts over source kinds (central-bank XML feed,
//! HTML key-rate table, spreadsheet, delimited text) so the orchestrator can
//! drive any of them and tests can substitute mocks.

use super::diagnostics::DiagnosticSink;
use crate::domain::{RateSeries, SourceUnit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for source operations.
///
/// Per-row and per-cell problems never surface here; they are reported
/// through the [`DiagnosticSink`] and the offending data is omitted. These
/// errors mean the whole unit is unusable.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("malformed content: {0}")]
    Parse(String),

    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported format '{extension}': {reason}")]
    UnsupportedFormat { extension: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{source_name} source cannot handle {unit}")]
    UnsupportedUnit { source_name: String, unit: String },
}

impl SourceError {
    pub(crate) fn unsupported_unit(source: &dyn RateSource, unit: &SourceUnit) -> Self {
        SourceError::UnsupportedUnit {
            source_name: source.name().to_string(),
            unit: unit.to_string(),
        }
    }
}

/// Closed set of source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Per-day XML document from a remote endpoint.
    RemoteXml,
    /// First `<table>` of a remote HTML listing page.
    RemoteHtmlTable,
    /// Local `.xlsx` / `.xls` workbook.
    Spreadsheet,
    /// Local semicolon-delimited UTF-8 `.csv`.
    DelimitedText,
}

impl SourceKind {
    /// Whether units of this kind come from the network.
    pub fn is_remote(self) -> bool {
        matches!(self, SourceKind::RemoteXml | SourceKind::RemoteHtmlTable)
    }
}

/// Trait for rate sources.
///
/// Implementations handle the specifics of fetching and parsing one source
/// format. The store sits above this trait; sources don't know about it.
pub trait RateSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Which kind of source this is.
    fn kind(&self) -> SourceKind;

    /// Fetch and parse one unit into a fragment of a rate series.
    ///
    /// A per-day remote source returns exactly one date; a file or page
    /// source returns zero or more dates, one per parseable row.
    fn fetch_and_parse(
        &self,
        unit: &SourceUnit,
        sink: &dyn DiagnosticSink,
    ) -> Result<RateSeries, SourceError>;
}
