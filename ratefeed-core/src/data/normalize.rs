//! Normalizer: raw source text into the canonical rate series.
//!
//! Sources hand over strings exactly as they appear in the document. This
//! module owns the two conversions every source shares:
//! - decimals with a comma separator (`"91,50"`) become exact [`Rate`]s
//! - dates in a fixed per-source format become [`NaiveDate`]s
//!
//! Failures are local. A bad cell drops that cell; a bad row date drops that
//! row. Both are reported through the [`DiagnosticSink`] and never abort the
//! surrounding merge.

use super::diagnostics::{Diagnostic, DiagnosticSink};
use crate::domain::{InstrumentCode, InstrumentError, Rate, RateSeries};
use chrono::NaiveDate;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid date '{text}' (expected {expected})")]
    InvalidDate {
        text: String,
        expected: &'static str,
    },

    #[error("invalid decimal '{0}'")]
    InvalidDecimal(String),

    #[error("negative rate '{0}'")]
    NegativeRate(String),

    #[error("{0}")]
    Code(#[from] InstrumentError),
}

/// Fixed date formats used by the supported sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY-MM-DD`, the internal and persisted form.
    Iso,
    /// `dd.mm.yyyy`, used by key-rate tables and tabular exports.
    Dotted,
    /// `dd/mm/yyyy`, used in the daily XML request parameter.
    Slashed,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::Dotted => "%d.%m.%Y",
            DateFormat::Slashed => "%d/%m/%Y",
        }
    }

    fn human(self) -> &'static str {
        match self {
            DateFormat::Iso => "YYYY-MM-DD",
            DateFormat::Dotted => "dd.mm.yyyy",
            DateFormat::Slashed => "dd/mm/yyyy",
        }
    }

    pub fn format(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

/// Parse a date in the given fixed format. Surrounding whitespace is ignored.
pub fn parse_date(text: &str, format: DateFormat) -> Result<NaiveDate, NormalizeError> {
    NaiveDate::parse_from_str(text.trim(), format.pattern()).map_err(|_| {
        NormalizeError::InvalidDate {
            text: text.to_string(),
            expected: format.human(),
        }
    })
}

/// Parse a non-negative decimal, accepting a comma as decimal separator.
///
/// Whitespace (including no-break spaces used as thousands separators) is
/// removed before parsing. The parsed scale is preserved: `"91,50"` stays
/// `91.50`.
pub fn parse_rate(text: &str) -> Result<Rate, NormalizeError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Err(NormalizeError::InvalidDecimal(text.to_string()));
    }
    let rate =
        Rate::from_str(&cleaned).map_err(|_| NormalizeError::InvalidDecimal(text.to_string()))?;
    if rate.is_sign_negative() && !rate.is_zero() {
        return Err(NormalizeError::NegativeRate(text.to_string()));
    }
    Ok(rate)
}

/// Merge one source fragment into an accumulating series.
///
/// Returns the number of dates the fragment touched. Values from the
/// fragment win over values already present for the same date and code.
pub fn merge_into(series: &mut RateSeries, fragment: RateSeries) -> usize {
    let touched = fragment.len();
    series.merge(fragment);
    touched
}

/// Builds one unit's fragment, reporting dropped cells and rows as it goes.
pub struct FragmentBuilder<'a> {
    source: &'a str,
    sink: &'a dyn DiagnosticSink,
    fragment: RateSeries,
}

impl<'a> FragmentBuilder<'a> {
    pub fn new(source: &'a str, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            source,
            sink,
            fragment: RateSeries::new(),
        }
    }

    /// Make sure `date` is present even if no cell for it survives.
    pub fn open_day(&mut self, date: NaiveDate) {
        self.fragment.row_mut(date);
    }

    /// Add one `(code, value)` cell on a known date. A bad code or value
    /// drops only this cell.
    pub fn push_cell(&mut self, date: NaiveDate, code: &str, value: &str) -> bool {
        let parsed = InstrumentCode::new(code)
            .map_err(NormalizeError::from)
            .and_then(|c| parse_rate(value).map(|rate| (c, rate)));
        match parsed {
            Ok((code, rate)) => {
                self.fragment.row_mut(date).insert(code, rate);
                true
            }
            Err(e) => {
                self.sink.emit(Diagnostic::CellDropped {
                    source: self.source.to_string(),
                    date,
                    code: code.trim().to_string(),
                    value: value.to_string(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Add a single-value row whose date is still text. A bad date or a bad
    /// value drops the whole row.
    pub fn push_row(
        &mut self,
        row: usize,
        date_text: &str,
        format: DateFormat,
        code: &InstrumentCode,
        value: &str,
    ) -> bool {
        let parsed = parse_date(date_text, format).and_then(|date| parse_rate(value).map(|r| (date, r)));
        match parsed {
            Ok((date, rate)) => {
                self.fragment.row_mut(date).insert(code.clone(), rate);
                true
            }
            Err(e) => {
                self.skip_row(row, &e.to_string());
                false
            }
        }
    }

    /// Report a row dropped for a reason found by the caller.
    pub fn skip_row(&self, row: usize, reason: &str) {
        self.sink.emit(Diagnostic::RowSkipped {
            source: self.source.to_string(),
            row,
            reason: reason.to_string(),
        });
    }

    pub fn finish(self) -> RateSeries {
        self.fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::diagnostics::CollectingSink;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn comma_decimal_becomes_exact_rate() {
        assert_eq!(parse_rate("91,50").unwrap(), Decimal::new(9150, 2));
        assert_eq!(parse_rate(" 16,00 ").unwrap().to_string(), "16.00");
        assert_eq!(parse_rate("1\u{a0}234,5").unwrap(), Decimal::new(12345, 1));
        assert_eq!(parse_rate("7.5").unwrap(), Decimal::new(75, 1));
    }

    #[test]
    fn rejects_garbage_and_negative_rates() {
        assert!(matches!(parse_rate(""), Err(NormalizeError::InvalidDecimal(_))));
        assert!(matches!(parse_rate("n/a"), Err(NormalizeError::InvalidDecimal(_))));
        assert!(matches!(parse_rate("-1,5"), Err(NormalizeError::NegativeRate(_))));
        assert_eq!(parse_rate("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn dates_use_the_fixed_format_only() {
        assert_eq!(parse_date("01.11.2023", DateFormat::Dotted).unwrap(), d(2023, 11, 1));
        assert_eq!(parse_date("2023-11-01", DateFormat::Iso).unwrap(), d(2023, 11, 1));
        assert!(parse_date("2023-11-01", DateFormat::Dotted).is_err());
        assert!(parse_date("31.02.2024", DateFormat::Dotted).is_err());
        assert_eq!(DateFormat::Slashed.format(d(2023, 11, 1)), "01/11/2023");
    }

    #[test]
    fn bad_cell_is_dropped_but_row_survives() {
        let sink = CollectingSink::new();
        let mut builder = FragmentBuilder::new("test", &sink);
        let date = d(2024, 1, 2);
        assert!(builder.push_cell(date, "USD", "89,50"));
        assert!(!builder.push_cell(date, "EUR", "oops"));
        let fragment = builder.finish();

        let row = fragment.get(date).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("USD"), Some(Decimal::new(8950, 2)));
        assert!(matches!(
            sink.snapshot()[0],
            Diagnostic::CellDropped { ref code, .. } if code == "EUR"
        ));
    }

    #[test]
    fn bad_row_date_drops_the_row() {
        let sink = CollectingSink::new();
        let code = InstrumentCode::new("KEY_RATE").unwrap();
        let mut builder = FragmentBuilder::new("test", &sink);
        assert!(builder.push_row(2, "16.02.2024", DateFormat::Dotted, &code, "16,00"));
        assert!(!builder.push_row(3, "not-a-date", DateFormat::Dotted, &code, "15,00"));
        let fragment = builder.finish();

        assert_eq!(fragment.len(), 1);
        assert!(matches!(sink.snapshot()[0], Diagnostic::RowSkipped { row: 3, .. }));
    }

    #[test]
    fn merge_reports_touched_dates() {
        let mut series = RateSeries::new();
        let mut fragment = RateSeries::new();
        fragment.row_mut(d(2024, 1, 2));
        fragment.row_mut(d(2024, 1, 3));
        assert_eq!(merge_into(&mut series, fragment), 2);
        assert_eq!(series.len(), 2);
    }
}
