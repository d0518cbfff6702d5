//! User-selected combination of band indicators per symbol.

use super::band::{self, BandSignal, DEFAULT_BAND_PERCENT, DEFAULT_EMA_PERIOD, DEFAULT_SMA_PERIOD};
use super::{UnitContext, UnitRow};
use crate::domain::error::UnitError;
use crate::domain::indicator::Cutoff;
use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN, price_label};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorChoice {
    DailyMovingAverage,
    ExponentialMovingAverage,
}

impl IndicatorChoice {
    pub const ALL: [IndicatorChoice; 2] = [
        IndicatorChoice::DailyMovingAverage,
        IndicatorChoice::ExponentialMovingAverage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorChoice::DailyMovingAverage => "daily moving average",
            IndicatorChoice::ExponentialMovingAverage => "exponential moving average",
        }
    }

    fn value_column(&self) -> &'static str {
        match self {
            IndicatorChoice::DailyMovingAverage => "dma",
            IndicatorChoice::ExponentialMovingAverage => "ema",
        }
    }

    fn action_column(&self) -> &'static str {
        match self {
            IndicatorChoice::DailyMovingAverage => "dma action",
            IndicatorChoice::ExponentialMovingAverage => "ema action",
        }
    }
}

impl fmt::Display for IndicatorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndicatorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily moving average" | "dma" => Ok(IndicatorChoice::DailyMovingAverage),
            "exponential moving average" | "ema" => Ok(IndicatorChoice::ExponentialMovingAverage),
            other => Err(format!("unknown indicator '{other}'")),
        }
    }
}

/// Report columns after `symbol` for the given selection.
pub fn columns(choices: &[IndicatorChoice], as_of: NaiveDate) -> Vec<String> {
    let mut columns = vec!["company".to_string(), price_label(as_of)];
    for choice in IndicatorChoice::ALL {
        if choices.contains(&choice) {
            columns.push(choice.value_column().to_string());
            columns.push(choice.action_column().to_string());
        }
    }
    columns
}

/// One symbol's selected indicators. A chosen indicator that failed is
/// `None` and renders as missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRow {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub choices: Vec<IndicatorChoice>,
    pub dma: Option<BandSignal>,
    pub ema: Option<BandSignal>,
}

impl MultiRow {
    fn signal(&self, choice: IndicatorChoice) -> Option<&BandSignal> {
        match choice {
            IndicatorChoice::DailyMovingAverage => self.dma.as_ref(),
            IndicatorChoice::ExponentialMovingAverage => self.ema.as_ref(),
        }
    }
}

impl UnitRow for MultiRow {
    fn to_record(&self) -> IndicatorRecord {
        let any = self.dma.as_ref().or(self.ema.as_ref());
        let mut record = IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with(
                "company",
                Cell::optional_text(any.map(|s| s.company.as_str())),
            )
            .with(
                price_label(self.as_of),
                Cell::optional_number(any.map(|s| s.close)),
            );

        for choice in IndicatorChoice::ALL {
            if !self.choices.contains(&choice) {
                continue;
            }
            let signal = self.signal(choice);
            record.push(
                choice.value_column(),
                Cell::optional_number(signal.map(|s| s.average)),
            );
            record.push(
                choice.action_column(),
                Cell::optional_text(signal.map(|s| s.action.as_str())),
            );
        }
        record
    }
}

/// Runs each chosen indicator with its default parameters as of the run date.
/// Fails only when every chosen indicator fails.
pub fn multi_choice(
    ctx: &UnitContext<'_>,
    symbol: &str,
    choices: &[IndicatorChoice],
) -> Result<MultiRow, UnitError> {
    let mut first_error = None;
    let mut run = |choice: IndicatorChoice| {
        let result = match choice {
            IndicatorChoice::DailyMovingAverage => band::dma_absolute(
                ctx,
                symbol,
                Cutoff::Latest,
                DEFAULT_SMA_PERIOD,
                DEFAULT_BAND_PERCENT,
            ),
            IndicatorChoice::ExponentialMovingAverage => band::ema_absolute(
                ctx,
                symbol,
                Cutoff::Latest,
                DEFAULT_EMA_PERIOD,
                DEFAULT_BAND_PERCENT,
            ),
        };
        match result {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!(symbol, indicator = %choice, error = %err, "indicator failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
                None
            }
        }
    };

    let dma = choices
        .contains(&IndicatorChoice::DailyMovingAverage)
        .then(|| run(IndicatorChoice::DailyMovingAverage))
        .flatten();
    let ema = choices
        .contains(&IndicatorChoice::ExponentialMovingAverage)
        .then(|| run(IndicatorChoice::ExponentialMovingAverage))
        .flatten();

    if dma.is_none() && ema.is_none() {
        return Err(first_error.unwrap_or(UnitError::InsufficientData {
            bars: 0,
            minimum: 1,
        }));
    }

    Ok(MultiRow {
        symbol: symbol.to_string(),
        as_of: ctx.today,
        choices: choices.to_vec(),
        dma,
        ema,
    })
}
