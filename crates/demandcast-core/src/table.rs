//! In-memory history table of monthly observations.
//!
//! A [`HistoryTable`] is the per-run working copy of one region's
//! observation history. The recursive driver extends it with synthesized
//! rows during a forecast run; the durable table it was loaded from is
//! never mutated here.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Months, NaiveDate};
use tracing::warn;

use crate::error::{ForecastError, Result};

/// One month's named numeric cells, tagged with its date.
///
/// A feature that could not be computed is simply absent; a stored NaN
/// reads back as absent too. Missing is never silently zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    date: NaiveDate,
    cells: BTreeMap<String, f64>,
}

impl FeatureRow {
    /// Create an empty row for `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cells: BTreeMap::new(),
        }
    }

    /// Create a row from an iterator of (name, value) cells.
    pub fn with_cells<I, S>(date: NaiveDate, cells: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut row = Self::new(date);
        for (name, value) in cells {
            row.set(name, value);
        }
        row
    }

    /// The row's month (first-of-month granularity).
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Set a cell value.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.cells.insert(name.into(), value);
    }

    /// Read a cell. Absent keys and NaN cells both read as `None`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.cells.get(name).copied().filter(|v| !v.is_nan())
    }

    /// Whether the row holds a usable (non-NaN) value for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of all cells present in this row.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

/// Ordered sequence of monthly rows for one region.
///
/// Invariants: rows are sorted by date ascending and dates are unique.
/// Calendar gaps between consecutive rows are tolerated (upstream data
/// entry may be incomplete) but logged.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTable {
    rows: Vec<FeatureRow>,
}

impl HistoryTable {
    /// Build a table from unsorted rows. Sorts by date, rejects
    /// duplicate dates, and warns about month gaps.
    pub fn new(mut rows: Vec<FeatureRow>) -> Result<Self> {
        rows.sort_by_key(|r| r.date);
        for pair in rows.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(ForecastError::DataMalformed(format!(
                    "duplicate observation date {}",
                    pair[0].date
                )));
            }
            let expected = pair[0].date.checked_add_months(Months::new(1));
            if expected != Some(pair[1].date) {
                warn!(
                    after = %pair[0].date,
                    next = %pair[1].date,
                    "gap in monthly history"
                );
            }
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, oldest first.
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Date of the most recent row.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Exact-date cell lookup. Returns `None` when no row exists at
    /// `date` or the row has no usable value for `column`.
    pub fn value_at(&self, column: &str, date: NaiveDate) -> Option<f64> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .and_then(|i| self.rows[i].get(column))
    }

    /// Extract a column across all rows, oldest first.
    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(name)).collect()
    }

    /// Number of rows with a usable value for `column`.
    pub fn non_null_count(&self, column: &str) -> usize {
        self.rows.iter().filter(|r| r.contains(column)).count()
    }

    /// Mean of `column` over the last `k` rows, skipping missing cells.
    /// `None` when none of those rows hold a value.
    pub fn tail_mean(&self, column: &str, k: usize) -> Option<f64> {
        let start = self.rows.len().saturating_sub(k);
        mean(self.rows[start..].iter().filter_map(|r| r.get(column)))
    }

    /// Mean of `column` over all rows, skipping missing cells.
    pub fn column_mean(&self, column: &str) -> Option<f64> {
        mean(self.rows.iter().filter_map(|r| r.get(column)))
    }

    /// Largest value of `column` across all rows, if any.
    pub fn column_max(&self, column: &str) -> Option<f64> {
        self.rows
            .iter()
            .filter_map(|r| r.get(column))
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    /// Append a row. The row must be dated strictly after the current
    /// latest row; the table stays sorted and duplicate-free.
    pub fn append(&mut self, row: FeatureRow) -> Result<()> {
        if let Some(last) = self.latest_date() {
            if row.date <= last {
                return Err(ForecastError::InvalidInput(format!(
                    "appended row at {} is not after latest date {}",
                    row.date, last
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Names of all columns present anywhere in the table.
    pub fn column_names(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|r| r.columns().map(str::to_string))
            .collect()
    }

    /// Forward-fill every column in place: each missing cell takes the
    /// last usable value observed above it. Cells with no prior value
    /// stay missing.
    pub fn forward_fill(&mut self) {
        for column in self.column_names() {
            let mut last: Option<f64> = None;
            for row in &mut self.rows {
                match row.get(&column) {
                    Some(v) => last = Some(v),
                    None => {
                        if let Some(v) = last {
                            row.set(column.clone(), v);
                        }
                    }
                }
            }
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}
