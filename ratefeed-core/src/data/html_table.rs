//! Key-rate history from the first HTML table of a listing page.
//!
//! Expected shape: a header row followed by data rows whose first two cells
//! are `dd.mm.yyyy` and a comma-decimal rate. Bad rows are skipped and
//! reported; a page without any `<table>` is unusable.

use super::diagnostics::DiagnosticSink;
use super::http;
use super::normalize::{DateFormat, FragmentBuilder};
use super::provider::{RateSource, SourceError, SourceKind};
use crate::domain::{InstrumentCode, RateSeries, SourceUnit};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// Default key-rate listing page.
pub const DEFAULT_KEY_RATE_URL: &str = "https://www.cbr.ru/hd_base/KeyRate/";

const SOURCE_NAME: &str = "key_rate_html";

/// Single-value rate history scraped from an HTML table.
pub struct KeyRateHtml {
    client: reqwest::blocking::Client,
    code: InstrumentCode,
}

impl KeyRateHtml {
    /// `code` is the instrument the table's values are stored under.
    pub fn new(code: InstrumentCode, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            code,
        })
    }
}

impl RateSource for KeyRateHtml {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::RemoteHtmlTable
    }

    fn fetch_and_parse(
        &self,
        unit: &SourceUnit,
        sink: &dyn DiagnosticSink,
    ) -> Result<RateSeries, SourceError> {
        let SourceUnit::Page(url) = unit else {
            return Err(SourceError::unsupported_unit(self, unit));
        };
        let body = http::get_text(&self.client, url, &[])?;
        parse_rate_table(&body, &self.code, sink)
    }
}

/// Parse the first `<table>` of `html`.
///
/// Rows are numbered from 1 including the header, so the first data row is
/// row 2 in diagnostics.
pub fn parse_rate_table(
    html: &str,
    code: &InstrumentCode,
    sink: &dyn DiagnosticSink,
) -> Result<RateSeries, SourceError> {
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;

    let document = Html::parse_document(html);
    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| SourceError::NotFound("no <table> element on the page".into()))?;

    let mut builder = FragmentBuilder::new(SOURCE_NAME, sink);

    // Rows and cells of tables nested inside a cell belong to that cell.
    let rows = table
        .select(&row_sel)
        .filter(|row| nearest_table(*row).is_some_and(|t| t.id() == table.id()));

    for (i, row) in rows.enumerate().skip(1) {
        let row_no = i + 1;
        let cells: Vec<String> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if cells.len() < 2 {
            builder.skip_row(row_no, &format!("expected 2 columns, found {}", cells.len()));
            continue;
        }

        builder.push_row(row_no, &cells[0], DateFormat::Dotted, code, &cells[1]);
    }

    Ok(builder.finish())
}

fn nearest_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("selector '{css}': {e:?}")))
}
