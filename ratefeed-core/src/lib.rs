//! Ratefeed Core: domain types, source adapters, normalizer, store, query engine.
//!
//! This crate contains everything needed to turn a rate source into an
//! answered query:
//! - Domain types (rate series, rows, instrument codes, source units)
//! - Source adapters for the central-bank XML feed, HTML key-rate tables,
//!   spreadsheets and semicolon-delimited CSV
//! - Normalizer (comma decimals, fixed date formats, best-effort merging)
//! - Diagnostics side-channel for skipped rows and failed units
//! - JSON store with atomic writes and a metadata sidecar
//! - Read-only query engine over a loaded series

pub mod data;
pub mod domain;
pub mod query;

pub use domain::{InstrumentCode, Rate, RateRow, RateSeries, SourceUnit};
pub use query::{QueryError, RateBook};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared with the parallel sweep are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<RateSeries>();
        require_sync::<RateSeries>();
        require_send::<SourceUnit>();
        require_sync::<SourceUnit>();
        require_send::<data::SourceError>();
        require_sync::<data::SourceError>();
        require_send::<data::CbrDailyXml>();
        require_sync::<data::CbrDailyXml>();
        require_send::<data::KeyRateHtml>();
        require_sync::<data::KeyRateHtml>();
        require_send::<data::TabularFile>();
        require_sync::<data::TabularFile>();
        require_send::<data::CollectingSink>();
        require_sync::<data::CollectingSink>();
    }
}
