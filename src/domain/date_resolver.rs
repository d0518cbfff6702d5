//! Resolution of a desired calendar date to the nearest prior trading date.
//!
//! Every date-anchored computation (EMA cutoff, momentum monthly lookback)
//! goes through [`DateResolver`].

use crate::domain::ohlcv::PriceSeries;
use chrono::{Months, NaiveDate};
use tracing::{debug, error, warn};

pub const DEFAULT_MAX_LOOKBACK: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("desired date {desired} is older than first recorded date {first}")]
    BeforeHistory { desired: NaiveDate, first: NaiveDate },

    #[error("no trading date within {lookback} days before {desired}")]
    NotFound { desired: NaiveDate, lookback: u32 },

    #[error("cannot step back {years}y {months}m from {from}")]
    OutOfCalendar {
        from: NaiveDate,
        years: u32,
        months: u32,
    },

    #[error("cannot step back {days} days from {from}")]
    DaysOutOfCalendar { from: NaiveDate, days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolver {
    max_lookback: u32,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOOKBACK)
    }
}

impl DateResolver {
    pub fn new(max_lookback: u32) -> Self {
        Self { max_lookback }
    }

    pub fn max_lookback(&self) -> u32 {
        self.max_lookback
    }

    /// Returns `desired` if it is a trading date in `series`, otherwise the
    /// closest earlier trading date at most `max_lookback` days back.
    pub fn resolve(
        &self,
        series: &PriceSeries,
        desired: NaiveDate,
    ) -> Result<NaiveDate, ResolveError> {
        let first = series.first_date().ok_or(ResolveError::EmptySeries)?;
        if desired < first {
            error!(
                symbol = series.symbol(),
                desired = %desired,
                first = %first,
                "desired date is older than first recorded date"
            );
            return Err(ResolveError::BeforeHistory { desired, first });
        }

        if series.contains(desired) {
            return Ok(desired);
        }

        let mut candidate = desired;
        for _ in 0..self.max_lookback {
            candidate = match candidate.pred_opt() {
                Some(d) => d,
                None => break,
            };
            if series.contains(candidate) {
                warn!(
                    symbol = series.symbol(),
                    desired = %desired,
                    resolved = %candidate,
                    "desired date not found, using nearest prior trading date"
                );
                return Ok(candidate);
            }
        }

        Err(ResolveError::NotFound {
            desired,
            lookback: self.max_lookback,
        })
    }

    /// Resolves the date `years` and `months` before the last trading date.
    /// Month arithmetic clamps to the end of shorter months.
    pub fn resolve_back(
        &self,
        series: &PriceSeries,
        years: u32,
        months: u32,
    ) -> Result<NaiveDate, ResolveError> {
        let last = series.last_date().ok_or(ResolveError::EmptySeries)?;
        let desired = last
            .checked_sub_months(Months::new(years * 12 + months))
            .ok_or(ResolveError::OutOfCalendar {
                from: last,
                years,
                months,
            })?;
        debug!(
            symbol = series.symbol(),
            desired = %desired,
            "resolving lookback date"
        );
        self.resolve(series, desired)
    }
}
