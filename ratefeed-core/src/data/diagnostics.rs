//! Diagnostics side-channel for best-effort parsing and partial-failure sweeps.
//!
//! Skipped rows, dropped cells and failed units are reported here rather than
//! printed, so the parsing code stays testable without capturing output.

use crate::domain::SourceUnit;
use chrono::NaiveDate;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One event reported by a source or the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A tabular row was dropped entirely (bad date, bad rate, too few columns).
    RowSkipped {
        source: String,
        row: usize,
        reason: String,
    },
    /// A single cell was dropped; the rest of its row was kept.
    CellDropped {
        source: String,
        date: NaiveDate,
        code: String,
        value: String,
        reason: String,
    },
    /// A whole unit failed and contributed nothing.
    UnitFailed { unit: SourceUnit, error: String },
    /// A unit finished and contributed `dates` dates.
    UnitCompleted { unit: SourceUnit, dates: usize },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::RowSkipped { .. } | Diagnostic::CellDropped { .. } => Severity::Warning,
            Diagnostic::UnitFailed { .. } => Severity::Error,
            Diagnostic::UnitCompleted { .. } => Severity::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RowSkipped {
                source,
                row,
                reason,
            } => write!(f, "{source}: skipped row {row}: {reason}"),
            Diagnostic::CellDropped {
                source,
                date,
                code,
                value,
                reason,
            } => write!(f, "{source}: dropped {code}='{value}' on {date}: {reason}"),
            Diagnostic::UnitFailed { unit, error } => write!(f, "{unit} failed: {error}"),
            Diagnostic::UnitCompleted { unit, dates } => {
                write!(f, "{unit} complete: {dates} date(s)")
            }
        }
    }
}

/// Receiver for diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at a matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::RowSkipped {
                source,
                row,
                reason,
            } => tracing::warn!(source = %source, row, "skipping row: {reason}"),
            Diagnostic::CellDropped {
                source,
                date,
                code,
                value,
                reason,
            } => tracing::warn!(source = %source, %date, code = %code, value = %value, "dropping cell: {reason}"),
            Diagnostic::UnitFailed { unit, error } => {
                tracing::error!(unit = %unit, "unit failed: {error}")
            }
            Diagnostic::UnitCompleted { unit, dates } => {
                tracing::info!(unit = %unit, dates, "unit complete")
            }
        }
    }
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything collected so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Drain into another sink, preserving order.
    pub fn replay_into(&self, sink: &dyn DiagnosticSink) {
        for diagnostic in self.take() {
            sink.emit(diagnostic);
        }
    }

    /// Number of collected diagnostics at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.severity() >= severity)
            .count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_replays_in_order() {
        let first = CollectingSink::new();
        first.emit(Diagnostic::RowSkipped {
            source: "csv".into(),
            row: 3,
            reason: "bad date".into(),
        });
        first.emit(Diagnostic::UnitCompleted {
            unit: SourceUnit::Page("http://example".into()),
            dates: 2,
        });

        let second = CollectingSink::new();
        first.replay_into(&second);

        assert!(first.snapshot().is_empty());
        let replayed = second.snapshot();
        assert_eq!(replayed.len(), 2);
        assert!(matches!(replayed[0], Diagnostic::RowSkipped { row: 3, .. }));
        assert_eq!(second.count_at_least(Severity::Warning), 1);
    }

    #[test]
    fn display_names_the_row() {
        let d = Diagnostic::RowSkipped {
            source: "key_rate_html".into(),
            row: 3,
            reason: "invalid date".into(),
        };
        assert_eq!(d.to_string(), "key_rate_html: skipped row 3: invalid date");
    }
}
