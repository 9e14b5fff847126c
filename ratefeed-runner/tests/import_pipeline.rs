//! Single-unit imports: structural failures propagate before persistence.

use chrono::NaiveDate;
use ratefeed_core::data::{CollectingSink, Diagnostic, JsonStore, SourceError};
use ratefeed_core::InstrumentCode;
use ratefeed_runner::{
    run_from_file, ImportOptions, Pipeline, PipelineConfig, PipelineError,
};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn key_rate() -> InstrumentCode {
    InstrumentCode::new("KEY_RATE").unwrap()
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn csv_missing_rate_column_fails_before_any_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "rates.csv", "Date;Value\n16.02.2024;16,00\n");
    let store = JsonStore::new(dir.path().join("out/rates.json"));

    let err = run_from_file(
        &csv,
        key_rate(),
        &store,
        &ImportOptions::default(),
        &CollectingSink::new(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Source(SourceError::Schema { .. })));
    assert!(!store.path().exists());
    assert!(store.meta().is_none());
}

#[test]
fn missing_and_unsupported_files_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("rates.json"));
    let sink = CollectingSink::new();

    let err = run_from_file(
        &dir.path().join("absent.csv"),
        key_rate(),
        &store,
        &ImportOptions::default(),
        &sink,
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Source(SourceError::NotFound(_))));

    let pdf = write_csv(dir.path(), "Key_rate.PDF", "%PDF-1.4");
    let err = run_from_file(&pdf, key_rate(), &store, &ImportOptions::default(), &sink)
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Source(SourceError::UnsupportedFormat { .. })
    ));
    assert!(!store.path().exists());
}

#[test]
fn csv_import_persists_good_rows_and_reports_bad_ones() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "rates.csv",
        "Дата;Ставка\n16.02.2024;16,00\n31.02.2024;16,00\n18.12.2023;15,00\n",
    );
    let store = JsonStore::new(dir.path().join("rates.json"));
    let sink = CollectingSink::new();

    let summary =
        run_from_file(&csv, key_rate(), &store, &ImportOptions::default(), &sink).unwrap();

    assert_eq!(summary.source, "csv");
    assert_eq!(summary.dates, 2);
    assert_eq!(store.load().unwrap(), summary.series);
    assert_eq!(
        summary.series.get(d(2023, 12, 18)).unwrap().get("KEY_RATE"),
        Some(Decimal::new(1500, 2))
    );

    let events = sink.snapshot();
    assert!(matches!(events[0], Diagnostic::RowSkipped { row: 3, .. }));
    assert!(matches!(
        events.last(),
        Some(Diagnostic::UnitCompleted { dates: 2, .. })
    ));
}

#[test]
fn xlsx_import_persists_native_date_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path().join("parsed_data/key_rate.json"));
    let sink = CollectingSink::new();

    let summary = run_from_file(
        &fixture("key_rate.xlsx"),
        key_rate(),
        &store,
        &ImportOptions::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(summary.source, "spreadsheet");
    assert_eq!(summary.dates, 2);
    assert_eq!(store.load().unwrap(), summary.series);
    assert_eq!(store.meta().unwrap().source, "spreadsheet");

    let stored = store.load().unwrap();
    let rate = stored.get(d(2024, 2, 16)).unwrap().get("KEY_RATE").unwrap();
    assert_eq!(rate.to_string(), "16.00");

    let events = sink.snapshot();
    assert!(matches!(events[0], Diagnostic::RowSkipped { row: 4, .. }));
}

#[test]
fn merge_existing_keeps_prior_instruments() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        store_path: dir.path().join("rates.json"),
        ..PipelineConfig::default()
    };

    let first = write_csv(dir.path(), "a.csv", "Date;Rate\n01.02.2024;16,00\n");
    let second = write_csv(dir.path(), "b.csv", "Date;Rate\n02.02.2024;16,00\n");

    let pipeline = Pipeline::new(config)
        .unwrap()
        .with_sink(CollectingSink::new());
    pipeline.run_from_file(&first).unwrap();
    let summary = pipeline.run_from_file(&second).unwrap();
    assert_eq!(summary.series.len(), 1);

    let pipeline = pipeline.with_merge_existing(true);
    pipeline.run_from_file(&first).unwrap();
    let book = pipeline.open_book().unwrap();
    assert_eq!(book.date_span(), Some((d(2024, 2, 1), d(2024, 2, 2))));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = PipelineConfig {
        workers: 0,
        ..PipelineConfig::default()
    };
    assert!(matches!(Pipeline::new(config), Err(PipelineError::Config(_))));
}
