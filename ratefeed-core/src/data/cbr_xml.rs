//! Central-bank daily XML source.
//!
//! One request per calendar day: `GET {base_url}?date_req=dd/mm/yyyy`. The
//! response is a root element with repeated currency elements:
//!
//! ```xml
//! <ValCurs Date="02.11.2023" name="Foreign Currency Market">
//!   <Valute ID="R01235">
//!     <CharCode>USD</CharCode>
//!     <Value>93,2264</Value>
//!   </Valute>
//! </ValCurs>
//! ```
//!
//! The row is keyed by the requested date, even when the document declares
//! a different effective date (weekends and holidays carry the last
//! published rates).

use super::diagnostics::DiagnosticSink;
use super::http;
use super::normalize::{DateFormat, FragmentBuilder};
use super::provider::{RateSource, SourceError, SourceKind};
use crate::domain::{RateSeries, SourceUnit};
use chrono::NaiveDate;
use std::time::Duration;

/// Default endpoint of the daily feed.
pub const DEFAULT_DAILY_URL: &str = "http://www.cbr.ru/scripts/XML_daily.asp";

const SOURCE_NAME: &str = "cbr_daily_xml";
const CURRENCY_TAG: &str = "Valute";
const CODE_TAG: &str = "CharCode";
const VALUE_TAG: &str = "Value";

/// Daily currency rates from the central-bank XML endpoint.
pub struct CbrDailyXml {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl CbrDailyXml {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_day(&self, date: NaiveDate) -> Result<String, SourceError> {
        http::get_text(
            &self.client,
            &self.base_url,
            &[("date_req", DateFormat::Slashed.format(date))],
        )
    }
}

impl RateSource for CbrDailyXml {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::RemoteXml
    }

    fn fetch_and_parse(
        &self,
        unit: &SourceUnit,
        sink: &dyn DiagnosticSink,
    ) -> Result<RateSeries, SourceError> {
        let SourceUnit::Day(date) = unit else {
            return Err(SourceError::unsupported_unit(self, unit));
        };
        let body = self.fetch_day(*date)?;
        parse_daily_xml(*date, &body, sink)
    }
}

/// Parse one daily document into a single-date fragment.
///
/// A currency element without a code or value child makes the whole
/// document malformed. A value that is present but not a decimal only drops
/// that currency.
pub fn parse_daily_xml(
    date: NaiveDate,
    body: &str,
    sink: &dyn DiagnosticSink,
) -> Result<RateSeries, SourceError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| SourceError::Parse(format!("invalid XML for {date}: {e}")))?;

    let mut builder = FragmentBuilder::new(SOURCE_NAME, sink);
    builder.open_day(date);

    let currencies = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name(CURRENCY_TAG));

    for (i, currency) in currencies.enumerate() {
        let code = child_text(&currency, CODE_TAG)
            .ok_or_else(|| missing_child(date, i, CODE_TAG))?;
        let value = child_text(&currency, VALUE_TAG)
            .ok_or_else(|| missing_child(date, i, VALUE_TAG))?;
        builder.push_cell(date, code, value);
    }

    Ok(builder.finish())
}

fn child_text<'a>(node: &roxmltree::Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
}

fn missing_child(date: NaiveDate, index: usize, tag: &str) -> SourceError {
    SourceError::Parse(format!(
        "{CURRENCY_TAG} #{} for {date} has no <{tag}> text",
        index + 1
    ))
}
