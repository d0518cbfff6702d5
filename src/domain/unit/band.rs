//! Price against a percentage band around a moving average, gated by
//! turnover. Covers the daily (SMA) and exponential variants.

use super::{Action, UnitContext, UnitRow};
use crate::domain::date_resolver::ResolveError;
use crate::domain::error::UnitError;
use crate::domain::indicator::Cutoff;
use crate::domain::indicator::ema::exponential_moving_average;
use crate::domain::indicator::ratio::turnover;
use crate::domain::indicator::sma::simple_moving_average;
use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN, price_label};
use crate::domain::settings::TurnoverGate;
use chrono::{Months, NaiveDate};
use tracing::info;

pub const DEFAULT_SMA_PERIOD: usize = 200;
pub const DEFAULT_EMA_PERIOD: usize = 50;
pub const DEFAULT_BAND_PERCENT: f64 = 5.0;
/// History window fetched for the daily moving average.
pub const SMA_WINDOW_MONTHS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandAverage {
    Sma,
    Ema,
}

impl BandAverage {
    pub fn column(&self) -> &'static str {
        match self {
            BandAverage::Sma => "sma",
            BandAverage::Ema => "ema",
        }
    }
}

/// Report columns after `symbol`; the price column is labelled with `as_of`.
pub fn columns(average: BandAverage, as_of: NaiveDate) -> Vec<String> {
    vec![
        "company".to_string(),
        price_label(as_of),
        average.column().to_string(),
        "ideal buy".to_string(),
        "ideal sell".to_string(),
        "turnover in cr.".to_string(),
        "action".to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandSignal {
    pub symbol: String,
    pub company: String,
    pub average_kind: BandAverage,
    pub as_of: NaiveDate,
    pub close: f64,
    pub average: f64,
    pub ideal_buy: f64,
    pub ideal_sell: f64,
    /// Mean volume times the average, divided by the gate scale.
    pub turnover: f64,
    pub action: Action,
}

/// Inputs shared by both band variants once the average is known.
#[derive(Debug, Clone, Copy)]
pub struct BandInputs<'a> {
    pub close: f64,
    pub average: f64,
    pub volumes: &'a [f64],
    pub band_percent: f64,
    pub gate: TurnoverGate,
}

/// `buy` above the upper band, `sell` below the lower band, `no action` in
/// between (edges included); `low turnover` when the gate is not cleared.
pub fn classify(close: f64, ideal_buy: f64, ideal_sell: f64, turnover: f64, floor: f64) -> Action {
    if turnover <= floor {
        Action::LowTurnover
    } else if close > ideal_buy {
        Action::Buy
    } else if close < ideal_sell {
        Action::Sell
    } else {
        Action::NoAction
    }
}

impl BandSignal {
    pub fn new(
        symbol: &str,
        company: &str,
        average_kind: BandAverage,
        as_of: NaiveDate,
        inputs: BandInputs<'_>,
    ) -> Result<Self, UnitError> {
        let scaled = turnover(inputs.volumes, inputs.average)? / inputs.gate.scale;
        let ideal_buy = inputs.average * (1.0 + inputs.band_percent / 100.0);
        let ideal_sell = inputs.average * (1.0 - inputs.band_percent / 100.0);

        Ok(Self {
            symbol: symbol.to_string(),
            company: company.to_string(),
            average_kind,
            as_of,
            close: inputs.close,
            average: inputs.average,
            ideal_buy,
            ideal_sell,
            turnover: scaled,
            action: classify(inputs.close, ideal_buy, ideal_sell, scaled, inputs.gate.floor),
        })
    }
}

impl UnitRow for BandSignal {
    fn to_record(&self) -> IndicatorRecord {
        IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with("company", Cell::text(&self.company))
            .with(price_label(self.as_of), Cell::number(self.close))
            .with(self.average_kind.column(), Cell::number(self.average))
            .with("ideal buy", Cell::number(self.ideal_buy))
            .with("ideal sell", Cell::number(self.ideal_sell))
            .with("turnover in cr.", Cell::number(self.turnover))
            .with("action", Cell::text(self.action.as_str()))
    }
}

/// Daily moving average band over the 18 months up to the as-of date.
pub fn dma_absolute(
    ctx: &UnitContext<'_>,
    symbol: &str,
    end: Cutoff,
    period: usize,
    band_percent: f64,
) -> Result<BandSignal, UnitError> {
    let as_of = end.label_date(ctx.today);
    let start = as_of
        .checked_sub_months(Months::new(SMA_WINDOW_MONTHS))
        .ok_or(ResolveError::OutOfCalendar {
            from: as_of,
            years: 0,
            months: SMA_WINDOW_MONTHS,
        })?;
    info!(symbol, start = %start, end = %as_of, "retrieving history for dma");

    let series = ctx.data.fetch_history(symbol, start, as_of)?;
    let closes = series.closes();
    let average = simple_moving_average(&closes, period)?;
    let volumes: Vec<f64> = series.tail(period).iter().map(|b| b.volume as f64).collect();
    let close = series.last().map(|b| b.close).ok_or(UnitError::InsufficientData {
        bars: 0,
        minimum: period,
    })?;
    let quote = ctx.quote(symbol)?;

    BandSignal::new(
        symbol,
        &quote.long_name,
        BandAverage::Sma,
        as_of,
        BandInputs {
            close,
            average,
            volumes: &volumes,
            band_percent,
            gate: ctx.settings.turnover,
        },
    )
}

/// Exponential moving average band over the full history.
pub fn ema_absolute(
    ctx: &UnitContext<'_>,
    symbol: &str,
    cutoff: Cutoff,
    period: usize,
    band_percent: f64,
) -> Result<BandSignal, UnitError> {
    info!(symbol, period, "retrieving full history for ema band");
    let series = ctx.data.fetch_full_history(symbol)?;
    let ema = exponential_moving_average(
        &series,
        period,
        cutoff,
        &ctx.settings.ema,
        &ctx.resolver(),
    )?;
    let close = series
        .get(ema.date)
        .map(|b| b.close)
        .ok_or(UnitError::NoValueOn {
            indicator: "close".to_string(),
            date: ema.date,
        })?;
    let volumes: Vec<f64> = series.bars().iter().map(|b| b.volume as f64).collect();
    let quote = ctx.quote(symbol)?;

    BandSignal::new(
        symbol,
        &quote.long_name,
        BandAverage::Ema,
        cutoff.label_date(ctx.today),
        BandInputs {
            close,
            average: ema.value,
            volumes: &volumes,
            band_percent,
            gate: ctx.settings.turnover,
        },
    )
}
