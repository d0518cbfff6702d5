//! Typed table cells and the per-symbol indicator record.

use chrono::NaiveDate;
use std::fmt;

pub const SYMBOL_COLUMN: &str = "symbol";

/// One value in a report table.
///
/// `Missing` is the only invalid marker: numeric columns never carry text
/// sentinels and failures never default to zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
    Date(NaiveDate),
    Missing,
}

impl Cell {
    /// Non-finite values become `Missing`.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Missing
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn optional_number(value: Option<f64>) -> Self {
        value.map_or(Cell::Missing, Cell::number)
    }

    pub fn optional_integer(value: Option<i64>) -> Self {
        value.map_or(Cell::Missing, Cell::Integer)
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Missing, Cell::text)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// CSV field text: two-decimal floats, `dd-mm-yyyy` dates, empty when missing.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => format!("{v:.2}"),
            Cell::Integer(v) => v.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%d-%m-%Y").to_string(),
            Cell::Missing => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Label for a price column anchored to `date`, e.g. `price (31-12-2021)`.
pub fn price_label(date: NaiveDate) -> String {
    format!("price ({})", date.format("%d-%m-%Y"))
}

/// One symbol's output for one indicator call, as ordered `(column, cell)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorRecord {
    cells: Vec<(String, Cell)>,
}

impl IndicatorRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with a `symbol` column followed by `columns`, all missing.
    pub fn placeholder<S: AsRef<str>>(symbol: &str, columns: &[S]) -> Self {
        columns.iter().fold(
            Self::new().with(SYMBOL_COLUMN, Cell::text(symbol)),
            |record, column| record.with(column.as_ref(), Cell::Missing),
        )
    }

    pub fn with(mut self, column: impl Into<String>, cell: Cell) -> Self {
        self.push(column, cell);
        self
    }

    /// Sets `column`, replacing the existing cell if the column is present.
    pub fn push(&mut self, column: impl Into<String>, cell: Cell) {
        let column = column.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = cell,
            None => self.cells.push((column, cell)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, cell)| cell)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> &[(String, Cell)] {
        &self.cells
    }

    pub fn symbol(&self) -> Option<&str> {
        self.get(SYMBOL_COLUMN).and_then(Cell::as_text)
    }

    pub fn non_missing_count(&self) -> usize {
        self.cells.iter().filter(|(_, c)| !c.is_missing()).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
