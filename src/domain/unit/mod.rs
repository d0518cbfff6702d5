//! Per-symbol unit computations.
//!
//! Each unit fetches what it needs through the [`DataPort`], runs the
//! indicator math and returns a typed row or a [`UnitError`]. Units never
//! panic and never retry; the batch runner decides what a failure becomes.

pub mod band;
pub mod crossover;
pub mod ema;
pub mod momentum;
pub mod multi;
pub mod quote;
pub mod volume;

use crate::domain::date_resolver::DateResolver;
use crate::domain::error::UnitError;
use crate::domain::quote::QuoteRecord;
use crate::domain::record::IndicatorRecord;
use crate::domain::settings::AnalysisSettings;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fmt;

/// Everything a unit computation reads besides its own parameters.
#[derive(Clone, Copy)]
pub struct UnitContext<'a> {
    pub data: &'a dyn DataPort,
    pub settings: &'a AnalysisSettings,
    /// Run date; the as-of date whenever a unit is asked for "today".
    pub today: NaiveDate,
}

impl<'a> UnitContext<'a> {
    pub fn new(data: &'a dyn DataPort, settings: &'a AnalysisSettings, today: NaiveDate) -> Self {
        Self {
            data,
            settings,
            today,
        }
    }

    pub fn resolver(&self) -> DateResolver {
        self.settings.resolver()
    }

    pub(crate) fn quote(&self, symbol: &str) -> Result<QuoteRecord, UnitError> {
        self.data
            .fetch_quote(symbol)
            .map_err(|e| UnitError::QuoteUnavailable {
                reason: e.to_string(),
            })
    }
}

/// Typed unit output that can be laid out as a report row.
pub trait UnitRow {
    fn to_record(&self) -> IndicatorRecord;
}

/// Trading call shared by the EMA and band indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    NoAction,
    LowTurnover,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::NoAction => "no action",
            Action::LowTurnover => "low turnover",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::ohlcv::{PriceBar, PriceSeries};
    use chrono::{Datelike, NaiveDate, Weekday};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Weekday bars from `start` to `end`; `close(i)` prices the i-th bar.
    pub fn weekday_series(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        close: impl Fn(usize) -> f64,
        volume: i64,
    ) -> PriceSeries {
        let bars = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .enumerate()
            .map(|(i, date)| {
                let c = close(i);
                PriceBar {
                    date,
                    open: c,
                    high: c,
                    low: c,
                    close: c,
                    adj_close: c,
                    volume,
                }
            })
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }
}
