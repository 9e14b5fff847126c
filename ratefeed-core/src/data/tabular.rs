//! Local tabular sources: spreadsheets and semicolon-delimited CSV.
//!
//! Both require a date column and a rate column. Headers are matched
//! exactly after trimming; the central-bank exports use `Дата` / `Ставка`,
//! English exports use `Date` / `Rate`. Each data row is parsed on its own
//! and a malformed row is skipped with a diagnostic.

use super::diagnostics::DiagnosticSink;
use super::normalize::{DateFormat, FragmentBuilder};
use super::provider::{RateSource, SourceError, SourceKind};
use crate::domain::{InstrumentCode, Rate, RateSeries, SourceUnit};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use std::str::FromStr;

const DATE_HEADERS: [&str; 2] = ["Дата", "Date"];
const RATE_HEADERS: [&str; 2] = ["Ставка", "Rate"];

/// Decimal places given to numeric cells, which carry no scale of their own.
/// Matches the two-place rates of the published key-rate tables.
const NUMERIC_CELL_SCALE: u32 = 2;

/// File format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Spreadsheet,
    DelimitedText,
}

impl FileFormat {
    /// Pick the format from the file extension (case-insensitive).
    ///
    /// Document formats such as PDF are recognised but explicitly rejected.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xls" => Ok(FileFormat::Spreadsheet),
            "csv" => Ok(FileFormat::DelimitedText),
            "pdf" | "doc" | "docx" => Err(SourceError::UnsupportedFormat {
                extension: ext,
                reason: "document sources cannot be parsed as rate tables".into(),
            }),
            _ => Err(SourceError::UnsupportedFormat {
                extension: ext,
                reason: "unrecognized file extension".into(),
            }),
        }
    }

    pub fn kind(self) -> SourceKind {
        match self {
            FileFormat::Spreadsheet => SourceKind::Spreadsheet,
            FileFormat::DelimitedText => SourceKind::DelimitedText,
        }
    }

    fn source_name(self) -> &'static str {
        match self {
            FileFormat::Spreadsheet => "spreadsheet",
            FileFormat::DelimitedText => "csv",
        }
    }
}

/// Single-value rate history from a local file of one format.
#[derive(Debug, Clone)]
pub struct TabularFile {
    format: FileFormat,
    code: InstrumentCode,
}

impl TabularFile {
    /// `code` is the instrument the file's values are stored under.
    pub fn new(format: FileFormat, code: InstrumentCode) -> Self {
        Self { format, code }
    }

    /// Select the adapter for `path`: the file must exist and its extension
    /// must name a supported format.
    pub fn for_path(path: &Path, code: InstrumentCode) -> Result<Self, SourceError> {
        ensure_exists(path)?;
        Ok(Self::new(FileFormat::from_path(path)?, code))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }
}

impl RateSource for TabularFile {
    fn name(&self) -> &str {
        self.format.source_name()
    }

    fn kind(&self) -> SourceKind {
        self.format.kind()
    }

    fn fetch_and_parse(
        &self,
        unit: &SourceUnit,
        sink: &dyn DiagnosticSink,
    ) -> Result<RateSeries, SourceError> {
        let SourceUnit::File(path) = unit else {
            return Err(SourceError::unsupported_unit(self, unit));
        };
        ensure_exists(path)?;
        match self.format {
            FileFormat::Spreadsheet => parse_spreadsheet(path, &self.code, sink),
            FileFormat::DelimitedText => parse_csv(path, &self.code, sink),
        }
    }
}

fn ensure_exists(path: &Path) -> Result<(), SourceError> {
    if path.exists() {
        Ok(())
    } else {
        Err(SourceError::NotFound(format!("file {}", path.display())))
    }
}

/// Find the date and rate columns, or name every missing one.
fn locate_columns<S: AsRef<str>>(headers: &[S]) -> Result<(usize, usize), SourceError> {
    let find = |names: &[&str]| {
        headers.iter().position(|h| {
            let h = h.as_ref().trim().trim_start_matches('\u{feff}');
            names.contains(&h)
        })
    };

    match (find(&DATE_HEADERS), find(&RATE_HEADERS)) {
        (Some(date), Some(rate)) => Ok((date, rate)),
        (date, rate) => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push(DATE_HEADERS.join("/"));
            }
            if rate.is_none() {
                missing.push(RATE_HEADERS.join("/"));
            }
            Err(SourceError::Schema { missing })
        }
    }
}

/// Parse a semicolon-delimited UTF-8 file with a header row.
pub fn parse_csv(
    path: &Path,
    code: &InstrumentCode,
    sink: &dyn DiagnosticSink,
) -> Result<RateSeries, SourceError> {
    let source = FileFormat::DelimitedText.source_name();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(path)
        .map_err(|e| SourceError::Io(format!("open {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Parse(format!("header row of {}: {e}", path.display())))?
        .clone();
    let (date_col, rate_col) = locate_columns(&headers.iter().collect::<Vec<_>>())?;

    let mut builder = FragmentBuilder::new(source, sink);

    for (i, result) in reader.records().enumerate() {
        // Header is row 1.
        let row_no = i + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                builder.skip_row(row_no, &e.to_string());
                continue;
            }
        };
        match (record.get(date_col), record.get(rate_col)) {
            (Some(date), Some(rate)) => {
                builder.push_row(row_no, date, DateFormat::Dotted, code, rate);
            }
            _ => builder.skip_row(row_no, "row is shorter than the header"),
        }
    }

    Ok(builder.finish())
}

/// Parse the first worksheet of a workbook; its first row is the header.
pub fn parse_spreadsheet(
    path: &Path,
    code: &InstrumentCode,
    sink: &dyn DiagnosticSink,
) -> Result<RateSeries, SourceError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SourceError::Parse(format!("open workbook {}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::Parse(format!("{} has no worksheets", path.display())))?
        .map_err(|e| SourceError::Parse(format!("read worksheet of {}: {e}", path.display())))?;

    parse_sheet_rows(range.rows(), code, sink)
}

/// Row-level spreadsheet parsing, separate from workbook I/O.
pub fn parse_sheet_rows<'r>(
    mut rows: impl Iterator<Item = &'r [Data]>,
    code: &InstrumentCode,
    sink: &dyn DiagnosticSink,
) -> Result<RateSeries, SourceError> {
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|c| cell_text(c).unwrap_or_default()).collect())
        .unwrap_or_default();
    let (date_col, rate_col) = locate_columns(&headers)?;

    let mut builder = FragmentBuilder::new(FileFormat::Spreadsheet.source_name(), sink);

    for (i, row) in rows.enumerate() {
        let row_no = i + 2;
        let date = row.get(date_col).and_then(cell_text);
        let rate = row.get(rate_col).and_then(cell_text);
        match (date, rate) {
            (Some(date), Some(rate)) => {
                builder.push_row(row_no, &date, DateFormat::Dotted, code, &rate);
            }
            // Fully blank rows are trailing padding, not data.
            (None, None) => {}
            _ => builder.skip_row(row_no, "empty date or rate cell"),
        }
    }

    Ok(builder.finish())
}

/// Render a cell as the text the normalizer expects.
///
/// Native dates become `dd.mm.yyyy`. Numbers are written with at least
/// [`NUMERIC_CELL_SCALE`] decimal places, so a numeric `16` cell stores as
/// `16.00` like the same value read from CSV or HTML.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Float(f) => Some(numeric_text(*f)),
        Data::Int(i) => Some(with_min_scale(Rate::from(*i)).to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| DateFormat::Dotted.format(dt.date())),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|iso| super::normalize::parse_date(iso, DateFormat::Iso).ok())
            .map(|date| DateFormat::Dotted.format(date)),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Shortest round-trip form of `value`, padded to the numeric cell scale.
/// Non-finite values are passed through for the normalizer to reject.
fn numeric_text(value: f64) -> String {
    let text = value.to_string();
    match Rate::from_str(&text) {
        Ok(rate) => with_min_scale(rate).to_string(),
        Err(_) => text,
    }
}

fn with_min_scale(mut rate: Rate) -> Rate {
    if rate.scale() < NUMERIC_CELL_SCALE {
        rate.rescale(NUMERIC_CELL_SCALE);
    }
    rate
}
