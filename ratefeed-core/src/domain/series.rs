//! Rate series: the canonical date-indexed structure every source normalizes into.

use super::{InstrumentCode, Rate};
use chrono::NaiveDate;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Rates for one date, keyed by instrument code.
///
/// A code present in one row is not guaranteed to be present in another;
/// sources add and remove instruments over time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateRow {
    rates: BTreeMap<InstrumentCode, Rate>,
}

impl RateRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rate, returning the value it replaced.
    pub fn insert(&mut self, code: InstrumentCode, rate: Rate) -> Option<Rate> {
        self.rates.insert(code, rate)
    }

    pub fn get(&self, code: &str) -> Option<Rate> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Iterate `(code, rate)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentCode, &Rate)> {
        self.rates.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &InstrumentCode> {
        self.rates.keys()
    }

    /// Merge another row into this one. Values from `other` win on conflict.
    pub fn merge(&mut self, other: RateRow) {
        self.rates.extend(other.rates);
    }
}

impl FromIterator<(InstrumentCode, Rate)> for RateRow {
    fn from_iter<I: IntoIterator<Item = (InstrumentCode, Rate)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Mapping from calendar date to [`RateRow`].
///
/// Keys are unique and kept in ascending date order; the series may be
/// sparse (missing days where a source had no data or a fetch failed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSeries {
    rows: BTreeMap<NaiveDate, RateRow>,
}

impl RateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the row for `date`, returning the previous row.
    pub fn insert(&mut self, date: NaiveDate, row: RateRow) -> Option<RateRow> {
        self.rows.insert(date, row)
    }

    /// Mutable access to the row for `date`, creating an empty row if absent.
    pub fn row_mut(&mut self, date: NaiveDate) -> &mut RateRow {
        self.rows.entry(date).or_default()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&RateRow> {
        self.rows.get(&date)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }

    /// Iterate rows in ascending date order.
    pub fn iter(&self) -> btree_map::Iter<'_, NaiveDate, RateRow> {
        self.rows.iter()
    }

    /// Rows with `from <= date <= to`, ascending. Empty when `from > to`.
    pub fn range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl DoubleEndedIterator<Item = (&NaiveDate, &RateRow)> {
        // BTreeMap::range panics on an inverted range
        let bounds = if from <= to { Some(from..=to) } else { None };
        bounds.into_iter().flat_map(move |b| self.rows.range(b))
    }

    /// Merge another series into this one, row by row. Values from `other` win.
    pub fn merge(&mut self, other: RateSeries) {
        for (date, row) in other.rows {
            self.row_mut(date).merge(row);
        }
    }

    /// Total number of `(date, code)` cells.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(RateRow::len).sum()
    }
}

impl FromIterator<(NaiveDate, RateRow)> for RateSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, RateRow)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RateSeries {
    type Item = (NaiveDate, RateRow);
    type IntoIter = btree_map::IntoIter<NaiveDate, RateRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RateSeries {
    type Item = (&'a NaiveDate, &'a RateRow);
    type IntoIter = btree_map::Iter<'a, NaiveDate, RateRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
