use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

/// Hourly time-indexed table of summed measurements.
///
/// Invariants: the hour index is strictly increasing with no duplicates, and
/// every row carries a value for every column, with 0.0 standing in for
/// measurements that never appeared at that hour. The column set is the union
/// of everything ever inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlyTable {
    columns: Vec<String>,
    rows: BTreeMap<NaiveDateTime, Vec<f64>>,
}

impl HourlyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the cell at (`hour`, `column`), creating the row and
    /// the column as needed. Repeated inserts at the same cell accumulate,
    /// which is what folds multiple price areas into one row.
    pub fn add(&mut self, hour: NaiveDateTime, column: &str, value: f64) {
        let idx = match self.columns.iter().position(|c| c == column) {
            Some(idx) => idx,
            None => {
                self.columns.push(column.to_string());
                for row in self.rows.values_mut() {
                    row.push(0.0);
                }
                self.columns.len() - 1
            }
        };
        let width = self.columns.len();
        let row = self.rows.entry(hour).or_insert_with(|| vec![0.0; width]);
        row[idx] += value;
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of distinct hours.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hour index in ascending order.
    pub fn hours(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.rows.keys().copied()
    }

    pub fn first_hour(&self) -> Option<NaiveDateTime> {
        self.rows.keys().next().copied()
    }

    pub fn last_hour(&self) -> Option<NaiveDateTime> {
        self.rows.keys().next_back().copied()
    }

    pub fn value(&self, hour: NaiveDateTime, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(&hour).map(|row| row[idx])
    }

    /// Values of one column in hour order, or `None` for an unknown column.
    pub fn column_values(&self, column: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.values().map(|row| row[idx]).collect())
    }

    /// Multiplies every value of `column` by `factor`. Unknown columns are
    /// silently ignored.
    pub fn scale_column(&mut self, column: &str, factor: f64) {
        if let Some(idx) = self.columns.iter().position(|c| c == column) {
            for row in self.rows.values_mut() {
                row[idx] *= factor;
            }
        }
    }

    /// Copy restricted to the inclusive [`start`, `end`] calendar-day window;
    /// open-ended where a bound is absent. A bound covers the whole day, so
    /// `end` keeps every hour of that date.
    pub fn restrict(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|(hour, _)| {
                start.map_or(true, |s| hour.date() >= s) && end.map_or(true, |e| hour.date() <= e)
            })
            .map(|(hour, row)| (*hour, row.clone()))
            .collect();
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }
}
