//! Read-only queries over a loaded rate series.

use crate::data::{JsonStore, StoreError};
use crate::domain::{InstrumentCode, Rate, RateSeries};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("series is empty: no latest date to query")]
    EmptySeries,
}

/// Query engine over one [`RateSeries`].
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    series: RateSeries,
}

impl RateBook {
    pub fn new(series: RateSeries) -> Self {
        Self { series }
    }

    /// Load the series currently persisted in `store`.
    pub fn load(store: &JsonStore) -> Result<Self, StoreError> {
        Ok(Self::new(store.load()?))
    }

    pub fn series(&self) -> &RateSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Exact date, exact code. Absent when either is missing.
    ///
    /// Codes are matched the way they are stored, so `usd` finds `USD`;
    /// text that is not a valid code matches nothing.
    pub fn rate_on(&self, date: NaiveDate, code: &str) -> Option<Rate> {
        let code = lookup_code(code)?;
        self.series.get(date)?.get(code.as_str())
    }

    /// Look up `code` on the most recent date of the whole series.
    ///
    /// Only the globally latest row is consulted: a code missing from that
    /// row is absent even if earlier dates carry it. Use
    /// [`latest_observation`](Self::latest_observation) for the most recent
    /// date that actually has the code.
    pub fn latest_rate(&self, code: &str) -> Result<Option<Rate>, QueryError> {
        let (_, row) = self
            .series
            .iter()
            .next_back()
            .ok_or(QueryError::EmptySeries)?;
        Ok(lookup_code(code).and_then(|code| row.get(code.as_str())))
    }

    /// Most recent date whose row contains `code`, with its rate.
    pub fn latest_observation(&self, code: &str) -> Option<(NaiveDate, Rate)> {
        let code = lookup_code(code)?;
        self.series
            .iter()
            .rev()
            .find_map(|(date, row)| row.get(code.as_str()).map(|rate| (*date, rate)))
    }

    /// Rates for `code` on `from..=to`, ascending by date. Dates without the
    /// code are left out; an inverted range is empty.
    pub fn rates_in_range(&self, from: NaiveDate, to: NaiveDate, code: &str) -> Vec<(NaiveDate, Rate)> {
        let Some(code) = lookup_code(code) else {
            return Vec::new();
        };
        self.series
            .range(from, to)
            .filter_map(|(date, row)| row.get(code.as_str()).map(|rate| (*date, rate)))
            .collect()
    }

    /// Every code seen on any date, sorted.
    pub fn instruments(&self) -> Vec<InstrumentCode> {
        self.series
            .iter()
            .flat_map(|(_, row)| row.codes().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First and last stored dates.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.series.first_date()?, self.series.last_date()?))
    }
}

fn lookup_code(code: &str) -> Option<InstrumentCode> {
    InstrumentCode::new(code).ok()
}

impl From<RateSeries> for RateBook {
    fn from(series: RateSeries) -> Self {
        Self::new(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn code(s: &str) -> InstrumentCode {
        InstrumentCode::new(s).unwrap()
    }

    /// USD on all three days, EUR only on the first two.
    fn book() -> RateBook {
        let mut series = RateSeries::new();
        series.row_mut(d(2023, 11, 1)).insert(code("USD"), Decimal::new(9150, 2));
        series.row_mut(d(2023, 11, 1)).insert(code("EUR"), Decimal::new(9812, 2));
        series.row_mut(d(2023, 11, 2)).insert(code("USD"), Decimal::new(9322, 2));
        series.row_mut(d(2023, 11, 2)).insert(code("EUR"), Decimal::new(9901, 2));
        series.row_mut(d(2023, 11, 3)).insert(code("USD"), Decimal::new(9100, 2));
        RateBook::new(series)
    }

    #[test]
    fn rate_on_exact_lookup() {
        let book = book();
        assert_eq!(book.rate_on(d(2023, 11, 2), "EUR"), Some(Decimal::new(9901, 2)));
        assert_eq!(book.rate_on(d(2023, 11, 3), "EUR"), None);
        assert_eq!(book.rate_on(d(2023, 10, 31), "USD"), None);
    }

    #[test]
    fn latest_rate_reads_only_the_globally_latest_row() {
        let book = book();
        assert_eq!(book.latest_rate("USD"), Ok(Some(Decimal::new(9100, 2))));
        // EUR exists on earlier dates but not on the latest one.
        assert_eq!(book.latest_rate("EUR"), Ok(None));
    }

    #[test]
    fn latest_rate_on_empty_series_is_an_error() {
        let book = RateBook::default();
        assert_eq!(book.latest_rate("USD"), Err(QueryError::EmptySeries));
    }

    #[test]
    fn latest_observation_scans_back_per_code() {
        let book = book();
        assert_eq!(
            book.latest_observation("EUR"),
            Some((d(2023, 11, 2), Decimal::new(9901, 2)))
        );
        assert_eq!(book.latest_observation("GBP"), None);
    }

    #[test]
    fn rates_in_range_is_inclusive_and_ascending() {
        let book = book();
        let usd = book.rates_in_range(d(2023, 11, 1), d(2023, 11, 3), "USD");
        assert_eq!(
            usd.iter().map(|(date, _)| *date).collect::<Vec<_>>(),
            vec![d(2023, 11, 1), d(2023, 11, 2), d(2023, 11, 3)]
        );

        let eur = book.rates_in_range(d(2023, 11, 2), d(2023, 11, 3), "EUR");
        assert_eq!(eur, vec![(d(2023, 11, 2), Decimal::new(9901, 2))]);
    }

    #[test]
    fn rates_in_range_without_matches_is_empty() {
        let book = book();
        assert!(book.rates_in_range(d(2024, 1, 1), d(2024, 2, 1), "USD").is_empty());
        assert!(book.rates_in_range(d(2023, 11, 3), d(2023, 11, 1), "USD").is_empty());
        assert!(RateBook::default()
            .rates_in_range(d(2023, 1, 1), d(2024, 1, 1), "USD")
            .is_empty());
    }

    #[test]
    fn lookups_match_codes_as_stored() {
        let book = book();
        assert_eq!(book.rate_on(d(2023, 11, 1), "usd"), Some(Decimal::new(9150, 2)));
        assert_eq!(book.rate_on(d(2023, 11, 1), " Eur "), Some(Decimal::new(9812, 2)));
        assert_eq!(book.latest_rate("usd"), Ok(Some(Decimal::new(9100, 2))));
        assert_eq!(book.latest_observation("eur").map(|(date, _)| date), Some(d(2023, 11, 2)));
        assert_eq!(book.rates_in_range(d(2023, 11, 1), d(2023, 11, 3), "usd").len(), 3);

        assert_eq!(book.rate_on(d(2023, 11, 1), "US D"), None);
        assert_eq!(book.latest_rate(""), Ok(None));
        assert!(book.rates_in_range(d(2023, 11, 1), d(2023, 11, 3), "u$d").is_empty());
    }

    #[test]
    fn instruments_and_span() {
        let book = book();
        assert_eq!(book.instruments(), vec![code("EUR"), code("USD")]);
        assert_eq!(book.date_span(), Some((d(2023, 11, 1), d(2023, 11, 3))));
        assert_eq!(RateBook::default().date_span(), None);
    }
}
