//! Two-period EMA comparison.

use super::{Action, UnitContext, UnitRow};
use crate::domain::error::UnitError;
use crate::domain::indicator::Cutoff;
use crate::domain::indicator::ema::exponential_moving_average;
use crate::domain::indicator::ratio::{Outcome, outcome_analysis, percentage_diff};
use crate::domain::ohlcv::PriceSeries;
use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN};
use crate::domain::settings::AnalysisSettings;
use chrono::NaiveDate;
use tracing::info;

pub const DEFAULT_PERIODS: (usize, usize) = (50, 200);

/// Report columns after `symbol`.
pub fn columns(periods: (usize, usize)) -> Vec<String> {
    vec![
        "ema_date".to_string(),
        format!("ema{}", periods.0),
        format!("ema{}", periods.1),
        "percentage_diff".to_string(),
        "outcome".to_string(),
        "action".to_string(),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmaPair {
    pub symbol: String,
    /// Label date of the cutoff: the run date for `Latest`.
    pub ema_date: NaiveDate,
    pub periods: (usize, usize),
    pub short: f64,
    pub long: f64,
    pub percentage_diff: f64,
    pub outcome: Outcome,
    pub action: Action,
}

impl EmaPair {
    pub fn from_series(
        series: &PriceSeries,
        periods: (usize, usize),
        cutoff: Cutoff,
        settings: &AnalysisSettings,
        today: NaiveDate,
    ) -> Result<Self, UnitError> {
        let resolver = settings.resolver();
        let short = exponential_moving_average(series, periods.0, cutoff, &settings.ema, &resolver)?;
        let long = exponential_moving_average(series, periods.1, cutoff, &settings.ema, &resolver)?;
        let diff = percentage_diff(short.value, long.value, true)?;

        Ok(Self {
            symbol: series.symbol().to_string(),
            ema_date: cutoff.label_date(today),
            periods,
            short: short.value,
            long: long.value,
            percentage_diff: diff,
            outcome: outcome_analysis(diff, settings.outcome_cutoff),
            action: if short.value > long.value {
                Action::Buy
            } else {
                Action::Sell
            },
        })
    }
}

impl UnitRow for EmaPair {
    fn to_record(&self) -> IndicatorRecord {
        IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with("ema_date", Cell::Date(self.ema_date))
            .with(format!("ema{}", self.periods.0), Cell::number(self.short))
            .with(format!("ema{}", self.periods.1), Cell::number(self.long))
            .with("percentage_diff", Cell::number(self.percentage_diff))
            .with("outcome", Cell::text(self.outcome.as_str()))
            .with("action", Cell::text(self.action.as_str()))
    }
}

pub fn ema_pair(
    ctx: &UnitContext<'_>,
    symbol: &str,
    periods: (usize, usize),
    cutoff: Cutoff,
) -> Result<EmaPair, UnitError> {
    info!(symbol, short = periods.0, long = periods.1, "retrieving full history for ema");
    let series = ctx.data.fetch_full_history(symbol)?;
    EmaPair::from_series(&series, periods, cutoff, ctx.settings, ctx.today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::ema::{EmaParams, EmaSeeding};
    use crate::domain::unit::fixtures::{date, weekday_series};

    fn standard() -> AnalysisSettings {
        AnalysisSettings {
            ema: EmaParams {
                seeding: EmaSeeding::Period,
                ..EmaParams::default()
            },
            ..AnalysisSettings::default()
        }
    }

    #[test]
    fn rising_prices_give_buy() {
        let series = weekday_series(
            "HDFCAMC",
            date(2020, 1, 1),
            date(2021, 12, 31),
            |i| 100.0 + i as f64,
            1000,
        );
        let today = date(2022, 1, 3);
        let pair = EmaPair::from_series(&series, (50, 200), Cutoff::Latest, &standard(), today)
            .unwrap();

        assert!(pair.short > pair.long);
        assert_eq!(pair.action, Action::Buy);
        assert_eq!(pair.ema_date, today);
        assert!(pair.percentage_diff >= 0.0);
    }

    #[test]
    fn falling_prices_give_sell() {
        let series = weekday_series(
            "WHIRLPOOL",
            date(2020, 1, 1),
            date(2021, 12, 31),
            |i| 2000.0 - i as f64,
            1000,
        );
        let pair = EmaPair::from_series(
            &series,
            (50, 200),
            Cutoff::Latest,
            &AnalysisSettings::default(),
            date(2022, 1, 3),
        )
        .unwrap();
        assert_eq!(pair.action, Action::Sell);
    }

    #[test]
    fn flat_prices_are_close_by() {
        let series = weekday_series("ABB", date(2020, 1, 1), date(2021, 12, 31), |_| 50.0, 1000);
        let pair = EmaPair::from_series(
            &series,
            (50, 200),
            Cutoff::Latest,
            &AnalysisSettings::default(),
            date(2022, 1, 3),
        )
        .unwrap();
        assert!(pair.percentage_diff.abs() < 1e-9);
        assert_eq!(pair.outcome, Outcome::CloseBy);
    }

    #[test]
    fn short_history_fails() {
        let series = weekday_series("NEWIPO", date(2021, 10, 1), date(2021, 12, 31), |_| 50.0, 1000);
        let err = EmaPair::from_series(
            &series,
            (50, 200),
            Cutoff::Latest,
            &AnalysisSettings::default(),
            date(2022, 1, 3),
        )
        .unwrap_err();
        assert!(matches!(err, UnitError::Math(_)));
    }

    #[test]
    fn dated_cutoff_labels_with_cutoff() {
        let series = weekday_series("ABB", date(2020, 1, 1), date(2021, 12, 31), |_| 50.0, 1000);
        let cutoff = date(2021, 6, 5);
        let pair = EmaPair::from_series(
            &series,
            (50, 200),
            Cutoff::On(cutoff),
            &AnalysisSettings::default(),
            date(2022, 1, 3),
        )
        .unwrap();
        assert_eq!(pair.ema_date, cutoff);
        let record = pair.to_record();
        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(
            columns,
            vec!["symbol", "ema_date", "ema50", "ema200", "percentage_diff", "outcome", "action"]
        );
    }
}
