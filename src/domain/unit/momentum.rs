//! Yearly and monthly momentum returns.

use super::{UnitContext, UnitRow};
use crate::domain::error::UnitError;
use crate::domain::indicator::returns::annualized_rate_of_return;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN, price_label};
use crate::domain::settings::AnalysisSettings;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Bars needed for the monthly leg, which measures its duration from the
/// 30th bar before the last.
pub const MOMENTUM_MIN_BARS: usize = 30;
pub const DEFAULT_TOP_COUNT: usize = 20;

/// Columns every row carries whatever its dates.
pub const FIXED_COLUMNS: [&str; 3] = ["company", "return_yearly", "return_monthly"];

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumRow {
    pub symbol: String,
    pub company: String,
    pub first_date: NaiveDate,
    pub first_close: f64,
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub return_yearly: f64,
    pub monthly_date: NaiveDate,
    pub monthly_close: f64,
    pub return_monthly: f64,
}

impl MomentumRow {
    pub fn from_series(
        series: &PriceSeries,
        company: &str,
        settings: &AnalysisSettings,
    ) -> Result<Self, UnitError> {
        let bars = series.bars();
        if bars.len() < MOMENTUM_MIN_BARS {
            return Err(UnitError::InsufficientData {
                bars: bars.len(),
                minimum: MOMENTUM_MIN_BARS,
            });
        }
        let first = &bars[0];
        let last = &bars[bars.len() - 1];

        let return_yearly = annualized_rate_of_return(last.close, first.close, 1.0)?;

        let monthly_date = settings.resolver().resolve_back(series, 0, 1)?;
        let monthly_close = series
            .get(monthly_date)
            .map(|b| b.close)
            .ok_or(UnitError::NoValueOn {
                indicator: "close".to_string(),
                date: monthly_date,
            })?;
        let span_start = bars[bars.len() - MOMENTUM_MIN_BARS].date;
        let months = (last.date - span_start).num_days() as f64 / 30.0;
        let return_monthly = annualized_rate_of_return(last.close, monthly_close, months)?;
        debug!(
            symbol = series.symbol(),
            return_yearly,
            return_monthly,
            monthly_start = %monthly_date,
            "momentum computed"
        );

        Ok(Self {
            symbol: series.symbol().to_string(),
            company: company.to_string(),
            first_date: first.date,
            first_close: first.close,
            last_date: last.date,
            last_close: last.close,
            return_yearly,
            monthly_date,
            monthly_close,
            return_monthly,
        })
    }
}

impl UnitRow for MomentumRow {
    fn to_record(&self) -> IndicatorRecord {
        IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with("company", Cell::text(&self.company))
            .with(price_label(self.first_date), Cell::number(self.first_close))
            .with(price_label(self.last_date), Cell::number(self.last_close))
            .with("return_yearly", Cell::number(self.return_yearly))
            .with(price_label(self.monthly_date), Cell::number(self.monthly_close))
            .with("return_monthly", Cell::number(self.return_monthly))
    }
}

/// Momentum over bars dated `start..=end`.
pub fn momentum(
    ctx: &UnitContext<'_>,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MomentumRow, UnitError> {
    info!(symbol, start = %start, end = %end, "retrieving history for momentum");
    let series = ctx.data.fetch_history(symbol, start, end)?;
    let quote = ctx.quote(symbol)?;
    MomentumRow::from_series(&series, &quote.long_name, ctx.settings)
}
