//! Source units: one fetch/parse task handed to a source adapter.

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;

/// One unit of work for a [`RateSource`](crate::data::RateSource).
///
/// Created by the orchestrator, consumed once, then discarded after it either
/// contributed to a series or was reported as failed. Units are never
/// retried within a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUnit {
    /// One calendar day against a remote per-day endpoint.
    Day(NaiveDate),
    /// One listing page at a remote URL.
    Page(String),
    /// One file on local storage.
    File(PathBuf),
}

impl SourceUnit {
    /// The requested date, for per-day units.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            SourceUnit::Day(date) => Some(*date),
            _ => None,
        }
    }
}

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceUnit::Day(date) => write!(f, "day {date}"),
            SourceUnit::Page(url) => write!(f, "page {url}"),
            SourceUnit::File(path) => write!(f, "file {}", path.display()),
        }
    }
}
