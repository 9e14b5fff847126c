//! Remote sources against a local mock HTTP server.

use chrono::NaiveDate;
use httpmock::prelude::*;
use ratefeed_core::data::{
    CbrDailyXml, CollectingSink, Diagnostic, KeyRateHtml, RateSource, SourceError, SourceKind,
};
use ratefeed_core::{InstrumentCode, SourceUnit};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn key_rate() -> InstrumentCode {
    InstrumentCode::new("KEY_RATE").unwrap()
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn daily_xml_sends_slashed_date_and_parses_body() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/scripts/XML_daily.asp")
            .query_param("date_req", "01/11/2023");
        then.status(200)
            .header("content-type", "application/xml; charset=utf-8")
            .body(fixture("daily_2023_11_01.xml"));
    });

    let source = CbrDailyXml::new(server.url("/scripts/XML_daily.asp"), TIMEOUT).unwrap();
    assert_eq!(source.kind(), SourceKind::RemoteXml);

    let sink = CollectingSink::new();
    let series = source
        .fetch_and_parse(&SourceUnit::Day(d(2023, 11, 1)), &sink)
        .unwrap();

    mock.assert();
    let row = series.get(d(2023, 11, 1)).unwrap();
    assert_eq!(row.get("EUR"), Some(Decimal::new(985038, 4)));
    assert!(sink.snapshot().is_empty());
}

#[test]
fn daily_xml_server_error_is_a_fetch_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/daily");
        then.status(500).body("internal error");
    });

    let source = CbrDailyXml::new(server.url("/daily"), TIMEOUT).unwrap();
    let err = source
        .fetch_and_parse(&SourceUnit::Day(d(2023, 11, 3)), &CollectingSink::new())
        .unwrap_err();

    assert!(matches!(err, SourceError::Fetch(_)));
    assert!(err.to_string().contains("500"));
}

#[test]
fn daily_xml_rejects_non_day_units() {
    let source = CbrDailyXml::new("http://127.0.0.1:9/unused", TIMEOUT).unwrap();
    let err = source
        .fetch_and_parse(&SourceUnit::Page("http://127.0.0.1:9/".into()), &CollectingSink::new())
        .unwrap_err();
    assert!(matches!(err, SourceError::UnsupportedUnit { .. }));
}

#[test]
fn key_rate_page_skips_bad_row_only() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/hd_base/KeyRate/");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(fixture("key_rate_page.html"));
    });

    let source = KeyRateHtml::new(key_rate(), TIMEOUT).unwrap();
    let sink = CollectingSink::new();
    let series = source
        .fetch_and_parse(&SourceUnit::Page(server.url("/hd_base/KeyRate/")), &sink)
        .unwrap();

    mock.assert();
    assert_eq!(series.len(), 3);
    assert_eq!(
        series.get(d(2023, 12, 18)).unwrap().get("KEY_RATE"),
        Some(Decimal::new(1500, 2))
    );
    assert!(matches!(
        sink.snapshot().as_slice(),
        [Diagnostic::RowSkipped { row: 4, .. }]
    ));
}

#[test]
fn key_rate_page_without_table_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/empty");
        then.status(200).body("<html><body><p>No data</p></body></html>");
    });

    let source = KeyRateHtml::new(key_rate(), TIMEOUT).unwrap();
    let err = source
        .fetch_and_parse(&SourceUnit::Page(server.url("/empty")), &CollectingSink::new())
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}
