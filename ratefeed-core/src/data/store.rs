//! JSON store: the durable on-disk form of a rate series.
//!
//! Layout: one pretty-printed JSON object mapping ISO dates to objects that
//! map instrument codes to decimal strings:
//!
//! ```json
//! {
//!   "2023-11-01": { "EUR": "98.1234", "USD": "91.50" }
//! }
//! ```
//!
//! Features:
//! - Full overwrite on every persist (merging is the caller's job)
//! - Atomic writes (stage both files as .tmp, then rename into place)
//! - Missing file loads as an empty series
//! - Metadata sidecar `<store>.meta.json` (date span, counts, hash, source)

use crate::domain::{InstrumentCode, Rate, RateRow, RateSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// On-disk document shape.
type Document = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store serialization failed: {0}")]
    Serialize(String),

    #[error("corrupt store {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Metadata sidecar written next to the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub day_count: usize,
    pub instrument_count: usize,
    pub data_hash: String,
    pub source: String,
    pub written_at: chrono::NaiveDateTime,
}

/// The JSON store.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the metadata sidecar: `{store}.meta.json`.
    pub fn meta_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    /// Overwrite the store with `series`.
    pub fn persist(&self, series: &RateSeries) -> Result<StoreMeta, StoreError> {
        self.persist_from(series, "ratefeed")
    }

    /// Overwrite the store with `series`, recording `source` in the sidecar.
    ///
    /// Both files are staged as `.tmp` before either is renamed, so a failed
    /// staging leaves the previous store and sidecar untouched. If the
    /// sidecar rename fails after the store was replaced, the old sidecar is
    /// removed rather than left describing data that is gone.
    pub fn persist_from(&self, series: &RateSeries, source: &str) -> Result<StoreMeta, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&to_document(series))
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        let meta = StoreMeta {
            first_date: series.first_date(),
            last_date: series.last_date(),
            day_count: series.len(),
            instrument_count: instrument_count(series),
            data_hash: blake3::hash(json.as_bytes()).to_hex().to_string(),
            source: source.to_string(),
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| StoreError::Serialize(format!("meta: {e}")))?;

        let meta_path = self.meta_path();
        let store_tmp = self.stage(&self.path, json.as_bytes())?;
        let meta_tmp = match self.stage(&meta_path, meta_json.as_bytes()) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&store_tmp);
                return Err(e);
            }
        };

        if let Err(e) = self.commit(&store_tmp, &self.path) {
            let _ = fs::remove_file(&meta_tmp);
            return Err(e);
        }
        if let Err(e) = self.commit(&meta_tmp, &meta_path) {
            let _ = fs::remove_file(&meta_path);
            tracing::warn!(path = %meta_path.display(), error = %e, "sidecar not written");
            return Err(e);
        }

        tracing::info!(
            path = %self.path.display(),
            days = meta.day_count,
            instruments = meta.instrument_count,
            "store persisted"
        );
        Ok(meta)
    }

    /// Load the stored series. A missing file is an empty series.
    pub fn load(&self) -> Result<RateSeries, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(RateSeries::new()),
            Err(e) => return Err(self.io_err(&self.path, e)),
        };

        let raw: BTreeMap<String, BTreeMap<String, serde_json::Value>> =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        let mut series = RateSeries::new();
        for (date_text, cells) in raw {
            let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d")
                .map_err(|_| self.corrupt(format!("invalid date key '{date_text}'")))?;
            let mut row = RateRow::new();
            for (code_text, value) in cells {
                let code = InstrumentCode::new(&code_text)
                    .map_err(|e| self.corrupt(format!("{date_text}: {e}")))?;
                let rate = decode_rate(&value).ok_or_else(|| {
                    self.corrupt(format!("{date_text}/{code_text}: invalid rate {value}"))
                })?;
                row.insert(code, rate);
            }
            series.insert(date, row);
        }
        Ok(series)
    }

    /// Read the metadata sidecar, if present and readable.
    pub fn meta(&self) -> Option<StoreMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Write `bytes` next to `path` as `<path>.tmp` and return that path.
    fn stage(&self, path: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, bytes).map_err(|e| self.io_err(&tmp_path, e))?;
        Ok(tmp_path)
    }

    fn commit(&self, tmp_path: &Path, path: &Path) -> Result<(), StoreError> {
        fs::rename(tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(tmp_path);
            self.io_err(path, e)
        })
    }

    fn io_err(&self, path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

fn to_document(series: &RateSeries) -> Document {
    series
        .iter()
        .map(|(date, row)| {
            let cells = row
                .iter()
                .map(|(code, rate)| (code.to_string(), rate.to_string()))
                .collect();
            (date.format("%Y-%m-%d").to_string(), cells)
        })
        .collect()
}

/// Rates are written as strings; bare JSON numbers are accepted on read.
fn decode_rate(value: &serde_json::Value) -> Option<Rate> {
    match value {
        serde_json::Value::String(s) => Rate::from_str(s).ok(),
        serde_json::Value::Number(n) => Rate::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

fn instrument_count(series: &RateSeries) -> usize {
    let mut codes: Vec<&InstrumentCode> = series.iter().flat_map(|(_, row)| row.codes()).collect();
    codes.sort();
    codes.dedup();
    codes.len()
}
