//! Source adapters, normalization, diagnostics and the JSON store

pub mod cbr_xml;
pub mod diagnostics;
pub mod html_table;
mod http;
pub mod normalize;
pub mod provider;
pub mod store;
pub mod tabular;

pub use cbr_xml::{parse_daily_xml, CbrDailyXml, DEFAULT_DAILY_URL};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, Severity, TracingSink};
pub use html_table::{parse_rate_table, KeyRateHtml, DEFAULT_KEY_RATE_URL};
pub use http::DEFAULT_TIMEOUT;
pub use normalize::{merge_into, parse_date, parse_rate, DateFormat, NormalizeError};
pub use provider::{RateSource, SourceError, SourceKind};
pub use store::{JsonStore, StoreError, StoreMeta};
pub use tabular::{FileFormat, TabularFile};
