//! Indicator math.
//!
//! Pure functions over closes and volumes:
//! - [`sma`]: simple moving average over a trailing window
//! - [`ema`]: exponential moving average anchored to a cutoff date
//! - [`returns`]: annualized rate of return
//! - [`ratio`]: percentage difference, turnover and outcome classification

pub mod ema;
pub mod ratio;
pub mod returns;
pub mod sma;

use chrono::NaiveDate;

/// Arithmetic that has no meaningful result for the given inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("period must be greater than zero")]
    ZeroPeriod,

    #[error("need {needed} values, have {available}")]
    InsufficientValues { needed: usize, available: usize },

    #[error("division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    #[error("non-finite result in {operation}")]
    NonFinite { operation: &'static str },

    #[error("{operand} must be positive in {operation}")]
    NonPositive {
        operation: &'static str,
        operand: &'static str,
    },
}

/// As-of date an indicator value is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cutoff {
    /// The last trading date of the series.
    #[default]
    Latest,
    /// A calendar date, resolved to the nearest prior trading date.
    On(NaiveDate),
}

impl Cutoff {
    /// The date the cutoff is labelled with in reports.
    pub fn label_date(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Cutoff::Latest => today,
            Cutoff::On(date) => *date,
        }
    }
}

/// An indicator value together with the trading date it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredValue {
    pub date: NaiveDate,
    pub value: f64,
}
