//! Tabular batch reports: column union, cleanup, ranking, 1:1 joins and
//! CSV rendering.

use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::io::Write;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    #[error("join on '{key}' is not one-to-one: {detail}")]
    JoinCardinality { key: String, detail: String },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("failed to write report: {reason}")]
    Write { reason: String },
}

/// Which rows survive cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRule {
    Keep,
    /// At least this many non-missing cells, the symbol included.
    MinValues(usize),
    /// No missing cell at all.
    Complete,
}

/// Row and column thresholds applied after a batch is tabulated.
/// Rows are filtered first, columns are judged on the surviving rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    pub rows: RowRule,
    pub min_column_values: Option<usize>,
}

impl CleanupPolicy {
    pub const KEEP_ALL: CleanupPolicy = CleanupPolicy {
        rows: RowRule::Keep,
        min_column_values: None,
    };

    pub const COMPLETE_ROWS: CleanupPolicy = CleanupPolicy {
        rows: RowRule::Complete,
        min_column_values: None,
    };

    pub fn min_row_values(n: usize) -> Self {
        CleanupPolicy {
            rows: RowRule::MinValues(n),
            min_column_values: None,
        }
    }

    pub fn with_min_column_values(mut self, n: usize) -> Self {
        self.min_column_values = Some(n);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl BatchReport {
    /// Tabulates records. The column list is the union of every record's
    /// columns; a column first seen in a later record is placed right after
    /// that record's preceding column.
    pub fn from_records(records: &[IndicatorRecord]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            let mut anchor: Option<usize> = None;
            for name in record.columns() {
                let pos = match columns.iter().position(|c| c == name) {
                    Some(pos) => pos,
                    None => {
                        let at = anchor.map_or(0, |a| a + 1).min(columns.len());
                        columns.insert(at, name.to_string());
                        at
                    }
                };
                anchor = Some(pos);
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Cell::Missing))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// A header with no rows.
    pub fn empty<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, ReportError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReportError::UnknownColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column).ok()?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn column(&self, name: &str) -> Result<Vec<&Cell>, ReportError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn null_count(&self, name: &str) -> Result<usize, ReportError> {
        Ok(self.column(name)?.into_iter().filter(|c| c.is_missing()).count())
    }

    /// Row for `symbol` as column/cell pairs.
    pub fn row_for(&self, symbol: &str) -> Option<Vec<(&str, &Cell)>> {
        let idx = self.column_index(SYMBOL_COLUMN).ok()?;
        self.rows
            .iter()
            .find(|r| r[idx].as_text() == Some(symbol))
            .map(|r| {
                self.columns
                    .iter()
                    .map(String::as_str)
                    .zip(r.iter())
                    .collect()
            })
    }

    /// Values of the `symbol` column, skipping rows where it is missing.
    pub fn symbols(&self) -> Vec<String> {
        match self.column(SYMBOL_COLUMN) {
            Ok(cells) => cells
                .into_iter()
                .filter_map(|c| c.as_text().map(str::to_string))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn cleanup(&mut self, policy: CleanupPolicy) {
        match policy.rows {
            RowRule::Keep => {}
            RowRule::MinValues(n) => self
                .rows
                .retain(|r| r.iter().filter(|c| !c.is_missing()).count() >= n),
            RowRule::Complete => self.rows.retain(|r| r.iter().all(|c| !c.is_missing())),
        }

        if let Some(min) = policy.min_column_values {
            let threshold = min.min(self.rows.len());
            let keep: Vec<bool> = (0..self.columns.len())
                .map(|i| self.rows.iter().filter(|r| !r[i].is_missing()).count() >= threshold)
                .collect();
            let mut flags = keep.iter();
            self.columns.retain(|_| *flags.next().unwrap_or(&true));
            for row in &mut self.rows {
                let mut flags = keep.iter();
                row.retain(|_| *flags.next().unwrap_or(&true));
            }
        }
    }

    /// Stable descending sort on a numeric column; missing and non-numeric
    /// cells sort last.
    pub fn sort_by_desc(&mut self, column: &str) -> Result<(), ReportError> {
        let idx = self.column_index(column)?;
        self.rows.sort_by(|a, b| match (a[idx].as_f64(), b[idx].as_f64()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(())
    }

    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Joins on `key`, requiring every key to appear exactly once on each
    /// side. Right-side columns already present on the left are dropped.
    pub fn join_one_to_one(&self, right: &BatchReport, key: &str) -> Result<BatchReport, ReportError> {
        let left_key = self.column_index(key)?;
        let right_key = right.column_index(key)?;

        let cardinality = |detail: String| ReportError::JoinCardinality {
            key: key.to_string(),
            detail,
        };

        let mut right_index: HashMap<String, usize> = HashMap::with_capacity(right.rows.len());
        for (i, row) in right.rows.iter().enumerate() {
            let value = row[right_key].render();
            if right_index.insert(value.clone(), i).is_some() {
                return Err(cardinality(format!("duplicate value '{value}' on right side")));
            }
        }

        let mut seen: HashSet<String> = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            let value = row[left_key].render();
            if !seen.insert(value.clone()) {
                return Err(cardinality(format!("duplicate value '{value}' on left side")));
            }
        }

        let extra: Vec<usize> = right
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !self.columns.contains(c))
            .map(|(i, _)| i)
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(extra.iter().map(|&i| right.columns[i].clone()));

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let value = row[left_key].render();
                let matched = right_index
                    .get(&value)
                    .ok_or_else(|| cardinality(format!("'{value}' has no match on right side")))?;
                let mut joined = row.clone();
                joined.extend(extra.iter().map(|&i| right.rows[*matched][i].clone()));
                Ok(joined)
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(BatchReport { columns, rows })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns).map_err(write_error)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(Cell::render))
                .map_err(write_error)?;
        }
        wtr.flush().map_err(|e| ReportError::Write {
            reason: e.to_string(),
        })
    }
}

fn write_error(err: csv::Error) -> ReportError {
    ReportError::Write {
        reason: err.to_string(),
    }
}

/// `{indicator}{p1}-{p2}[-p3]_{count}company_{dd-mm-yyyy}.csv`.
pub fn file_name(indicator: &str, params: &[String], count: usize, run_date: NaiveDate) -> String {
    format!(
        "{}{}_{}company_{}.csv",
        indicator,
        params.join("-"),
        count,
        run_date.format("%d-%m-%Y")
    )
}
