//! Exponential moving average.
//!
//! mf = smoothing/(1+n), EMA0 = C[n]*mf + SMA(first n)*(1-mf),
//! then EMA[i] = C[i]*mf + EMA[i-1]*(1-mf) for every bar past the seed offset.

use super::{AnchoredValue, Cutoff, MathError};
use crate::domain::date_resolver::DateResolver;
use crate::domain::error::UnitError;
use crate::domain::ohlcv::PriceSeries;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_SMOOTHING: f64 = 2.0;
pub const LEGACY_SEED_OFFSET: usize = 50;

/// Where the recursion starts after the seed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmaSeeding {
    /// Recursion starts at bar `k + 1` whatever the period. Reports produced
    /// before the standard seeding existed use `k = 50`.
    FixedOffset(usize),
    /// Seed sits on bar `period`, recursion continues from `period + 1`.
    Period,
}

impl Default for EmaSeeding {
    fn default() -> Self {
        EmaSeeding::FixedOffset(LEGACY_SEED_OFFSET)
    }
}

impl EmaSeeding {
    fn offset(&self, period: usize) -> usize {
        match self {
            EmaSeeding::FixedOffset(k) => *k,
            EmaSeeding::Period => period,
        }
    }

    fn min_bars(&self, period: usize) -> usize {
        match self {
            EmaSeeding::FixedOffset(k) => (period + 1).max(k + 2),
            EmaSeeding::Period => period + 1,
        }
    }
}

impl FromStr for EmaSeeding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" => Ok(EmaSeeding::FixedOffset(LEGACY_SEED_OFFSET)),
            "standard" => Ok(EmaSeeding::Period),
            other => Err(format!(
                "unknown EMA seeding '{other}', expected legacy or standard"
            )),
        }
    }
}

impl fmt::Display for EmaSeeding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmaSeeding::FixedOffset(k) => write!(f, "fixed offset {k}"),
            EmaSeeding::Period => write!(f, "standard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmaParams {
    pub smoothing: f64,
    pub seeding: EmaSeeding,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            seeding: EmaSeeding::default(),
        }
    }
}

/// Every EMA value the series yields, in date order.
pub fn ema_series(
    series: &PriceSeries,
    period: usize,
    params: &EmaParams,
) -> Result<Vec<AnchoredValue>, MathError> {
    if period == 0 {
        return Err(MathError::ZeroPeriod);
    }
    let bars = series.bars();
    let needed = params.seeding.min_bars(period);
    if bars.len() < needed {
        return Err(MathError::InsufficientValues {
            needed,
            available: bars.len(),
        });
    }

    let mf = params.smoothing / (1.0 + period as f64);
    let sma0 = bars[..period].iter().map(|b| b.close).sum::<f64>() / period as f64;
    let ema0 = bars[period].close * mf + sma0 * (1.0 - mf);

    let offset = params.seeding.offset(period);
    let mut values = Vec::with_capacity(bars.len() - offset);
    if params.seeding == EmaSeeding::Period {
        values.push(AnchoredValue {
            date: bars[period].date,
            value: ema0,
        });
    }

    let mut prev = ema0;
    for bar in &bars[offset + 1..] {
        prev = bar.close * mf + prev * (1.0 - mf);
        values.push(AnchoredValue {
            date: bar.date,
            value: prev,
        });
    }

    if values.iter().any(|v| !v.value.is_finite()) {
        return Err(MathError::NonFinite {
            operation: "exponential moving average",
        });
    }
    Ok(values)
}

/// The EMA on the trading date `cutoff` resolves to.
pub fn exponential_moving_average(
    series: &PriceSeries,
    period: usize,
    cutoff: Cutoff,
    params: &EmaParams,
    resolver: &DateResolver,
) -> Result<AnchoredValue, UnitError> {
    let values = ema_series(series, period, params)?;

    let date = match cutoff {
        Cutoff::Latest => series.last_date().ok_or(UnitError::InsufficientData {
            bars: 0,
            minimum: params.seeding.min_bars(period),
        })?,
        Cutoff::On(desired) => resolver.resolve(series, desired)?,
    };
    debug!(symbol = series.symbol(), period, date = %date, "ema anchored");

    values
        .binary_search_by_key(&date, |v| v.date)
        .map(|i| values[i])
        .map_err(|_| UnitError::NoValueOn {
            indicator: format!("EMA({period})"),
            date,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date_resolver::ResolveError;
    use crate::domain::ohlcv::PriceBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                adj_close: close,
                volume: 1000,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn params(seeding: EmaSeeding) -> EmaParams {
        EmaParams {
            smoothing: DEFAULT_SMOOTHING,
            seeding,
        }
    }

    #[test]
    fn fixed_offset_recursion_skips_to_offset() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let values = ema_series(&series, 2, &params(EmaSeeding::FixedOffset(2))).unwrap();

        // mf = 2/3, sma0 = 1.5, ema0 = 3*2/3 + 1.5/3 = 2.5
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].date, series.bars()[3].date);
        assert_relative_eq!(values[0].value, 3.5, epsilon = 1e-12);
        assert_relative_eq!(values[1].value, 4.5, epsilon = 1e-12);
    }

    #[test]
    fn standard_seeding_includes_seed_bar() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let values = ema_series(&series, 2, &params(EmaSeeding::Period)).unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values[0].date, series.bars()[2].date);
        assert_relative_eq!(values[0].value, 2.5, epsilon = 1e-12);
        assert_relative_eq!(values[2].value, 4.5, epsilon = 1e-12);
    }

    #[test]
    fn constant_prices_give_constant_ema() {
        let series = make_series(&[100.0; 80]);
        let values = ema_series(&series, 20, &EmaParams::default()).unwrap();
        assert_eq!(values.len(), 80 - LEGACY_SEED_OFFSET - 1);
        for v in values {
            assert_relative_eq!(v.value, 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn legacy_needs_offset_plus_two_bars() {
        let series = make_series(&[10.0; 51]);
        assert_eq!(
            ema_series(&series, 5, &EmaParams::default()),
            Err(MathError::InsufficientValues {
                needed: 52,
                available: 51
            })
        );
    }

    #[test]
    fn long_period_needs_period_plus_one_bars() {
        let series = make_series(&[10.0; 200]);
        assert!(matches!(
            ema_series(&series, 200, &EmaParams::default()),
            Err(MathError::InsufficientValues { needed: 201, .. })
        ));
    }

    #[test]
    fn latest_cutoff_uses_last_bar() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let value = exponential_moving_average(
            &series,
            2,
            Cutoff::Latest,
            &params(EmaSeeding::Period),
            &DateResolver::default(),
        )
        .unwrap();
        assert_eq!(value.date, series.last_date().unwrap());
        assert_relative_eq!(value.value, 4.5, epsilon = 1e-12);
    }

    #[test]
    fn dated_cutoff_after_history_resolves_to_last_bar() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let desired = series.last_date().unwrap() + chrono::Duration::days(3);
        let value = exponential_moving_average(
            &series,
            2,
            Cutoff::On(desired),
            &params(EmaSeeding::Period),
            &DateResolver::default(),
        )
        .unwrap();
        assert_eq!(value.date, series.last_date().unwrap());
    }

    #[test]
    fn cutoff_inside_warmup_has_no_value() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let desired = series.bars()[1].date;
        let err = exponential_moving_average(
            &series,
            2,
            Cutoff::On(desired),
            &params(EmaSeeding::Period),
            &DateResolver::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            UnitError::NoValueOn {
                indicator: "EMA(2)".into(),
                date: desired
            }
        );
    }

    #[test]
    fn cutoff_before_history_is_a_resolve_error() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let err = exponential_moving_average(
            &series,
            2,
            Cutoff::On(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()),
            &params(EmaSeeding::Period),
            &DateResolver::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            UnitError::Resolve(ResolveError::BeforeHistory { .. })
        ));
    }

    #[test]
    fn seeding_parses_from_config_names() {
        assert_eq!(
            "legacy".parse::<EmaSeeding>(),
            Ok(EmaSeeding::FixedOffset(LEGACY_SEED_OFFSET))
        );
        assert_eq!("Standard".parse::<EmaSeeding>(), Ok(EmaSeeding::Period));
        assert!("wilder".parse::<EmaSeeding>().is_err());
    }
}
