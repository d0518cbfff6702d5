//! Three-period EMA convergence.

use super::{Action, UnitContext, UnitRow};
use crate::domain::error::UnitError;
use crate::domain::indicator::Cutoff;
use crate::domain::indicator::ema::exponential_moving_average;
use crate::domain::indicator::ratio::percentage_diff;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN};
use crate::domain::settings::AnalysisSettings;
use chrono::NaiveDate;
use tracing::{debug, info};

pub const DEFAULT_PERIODS: (usize, usize, usize) = (5, 13, 26);

pub fn columns(periods: (usize, usize, usize)) -> Vec<String> {
    vec![
        "ema_date".to_string(),
        format!("ema{}", periods.0),
        format!("ema{}", periods.1),
        format!("ema{}", periods.2),
        "action".to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmaTriple {
    pub symbol: String,
    pub ema_date: NaiveDate,
    pub periods: (usize, usize, usize),
    pub values: (f64, f64, f64),
    pub action: Action,
}

impl EmaTriple {
    /// `Buy` only when every pair of the three EMAs sits within the
    /// crossover band of each other.
    pub fn from_series(
        series: &PriceSeries,
        periods: (usize, usize, usize),
        cutoff: Cutoff,
        settings: &AnalysisSettings,
        today: NaiveDate,
    ) -> Result<Self, UnitError> {
        let resolver = settings.resolver();
        let ema = |period| {
            exponential_moving_average(series, period, cutoff, &settings.ema, &resolver)
                .map(|v| v.value)
        };
        let (a, b, c) = (ema(periods.0)?, ema(periods.1)?, ema(periods.2)?);

        let diff_cb = percentage_diff(c, b, true)?;
        let diff_ca = percentage_diff(c, a, true)?;
        let diff_ba = percentage_diff(b, a, true)?;
        debug!(
            symbol = series.symbol(),
            diff_cb, diff_ca, diff_ba, "ema crossover spreads"
        );

        let band = settings.crossover_band;
        let action = if diff_cb < band && diff_ca < band && diff_ba < band {
            Action::Buy
        } else {
            Action::Sell
        };

        Ok(Self {
            symbol: series.symbol().to_string(),
            ema_date: cutoff.label_date(today),
            periods,
            values: (a, b, c),
            action,
        })
    }
}

impl UnitRow for EmaTriple {
    fn to_record(&self) -> IndicatorRecord {
        IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with("ema_date", Cell::Date(self.ema_date))
            .with(format!("ema{}", self.periods.0), Cell::number(self.values.0))
            .with(format!("ema{}", self.periods.1), Cell::number(self.values.1))
            .with(format!("ema{}", self.periods.2), Cell::number(self.values.2))
            .with("action", Cell::text(self.action.as_str()))
    }
}

pub fn ema_triple(
    ctx: &UnitContext<'_>,
    symbol: &str,
    periods: (usize, usize, usize),
    cutoff: Cutoff,
) -> Result<EmaTriple, UnitError> {
    info!(symbol, "retrieving full history for ema crossover");
    let series = ctx.data.fetch_full_history(symbol)?;
    EmaTriple::from_series(&series, periods, cutoff, ctx.settings, ctx.today)
}
