//! Domain types for Ratefeed

pub mod instrument;
pub mod series;
pub mod unit;

pub use instrument::{InstrumentCode, InstrumentError};
pub use series::{RateRow, RateSeries};
pub use unit::SourceUnit;

/// A non-negative decimal rate for one instrument on one date.
pub type Rate = rust_decimal::Decimal;
