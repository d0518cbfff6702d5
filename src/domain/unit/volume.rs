//! Volume over the last N calendar days against its mean.

use super::{UnitContext, UnitRow};
use crate::domain::date_resolver::ResolveError;
use crate::domain::error::UnitError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN};
use chrono::{Days, NaiveDate};
use tracing::info;

pub const DEFAULT_DURATION_DAYS: u32 = 90;

pub const COLUMNS: [&str; 6] = [
    "current date",
    "start date",
    "current volume",
    "mean volume",
    "close price",
    "action",
];

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSignal {
    pub symbol: String,
    pub current_date: NaiveDate,
    pub start_date: NaiveDate,
    pub current_volume: i64,
    pub mean_volume: f64,
    pub close: f64,
    /// Latest volume is above the window mean.
    pub action: bool,
}

impl VolumeSignal {
    pub fn from_series(series: &PriceSeries) -> Result<Self, UnitError> {
        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(UnitError::InsufficientData {
                    bars: 0,
                    minimum: 1,
                });
            }
        };
        let mean_volume =
            series.bars().iter().map(|b| b.volume as f64).sum::<f64>() / series.len() as f64;

        Ok(Self {
            symbol: series.symbol().to_string(),
            current_date: last.date,
            start_date: first.date,
            current_volume: last.volume,
            mean_volume,
            close: last.close,
            action: last.volume as f64 > mean_volume,
        })
    }
}

impl UnitRow for VolumeSignal {
    fn to_record(&self) -> IndicatorRecord {
        IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with("current date", Cell::Date(self.current_date))
            .with("start date", Cell::Date(self.start_date))
            .with("current volume", Cell::Integer(self.current_volume))
            .with("mean volume", Cell::number(self.mean_volume))
            .with("close price", Cell::number(self.close))
            .with("action", Cell::Bool(self.action))
    }
}

/// Bars from `duration` calendar days before the run date up to the run date.
pub fn volume_n_days(
    ctx: &UnitContext<'_>,
    symbol: &str,
    duration: u32,
) -> Result<VolumeSignal, UnitError> {
    let end = ctx.today;
    let start = end
        .checked_sub_days(Days::new(u64::from(duration)))
        .ok_or(ResolveError::DaysOutOfCalendar {
            from: end,
            days: duration,
        })?;
    info!(symbol, start = %start, end = %end, "retrieving volume window");

    let series = ctx.data.fetch_history(symbol, start, end)?;
    VolumeSignal::from_series(&series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use crate::domain::unit::fixtures::date;

    fn bar(day: u32, volume: i64, close: f64) -> PriceBar {
        PriceBar {
            date: date(2024, 3, day),
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume,
        }
    }

    #[test]
    fn spike_in_latest_volume_is_flagged() {
        let series = PriceSeries::new(
            "ADANIGREEN",
            vec![bar(4, 100, 10.0), bar(5, 100, 11.0), bar(6, 400, 12.0)],
        )
        .unwrap();
        let signal = VolumeSignal::from_series(&series).unwrap();

        assert_eq!(signal.current_date, date(2024, 3, 6));
        assert_eq!(signal.start_date, date(2024, 3, 4));
        assert_eq!(signal.current_volume, 400);
        assert!((signal.mean_volume - 200.0).abs() < 1e-9);
        assert!((signal.close - 12.0).abs() < f64::EPSILON);
        assert!(signal.action);
    }

    #[test]
    fn volume_at_mean_is_not_flagged() {
        let series =
            PriceSeries::new("HDFCAMC", vec![bar(4, 100, 10.0), bar(5, 100, 10.0)]).unwrap();
        assert!(!VolumeSignal::from_series(&series).unwrap().action);
    }

    #[test]
    fn empty_window_is_insufficient() {
        let series = PriceSeries::new("WHIRLPOOL", vec![]).unwrap();
        assert!(matches!(
            VolumeSignal::from_series(&series),
            Err(UnitError::InsufficientData { bars: 0, .. })
        ));
    }

    #[test]
    fn record_has_typed_cells() {
        let series = PriceSeries::new("ABB", vec![bar(4, 100, 10.0)]).unwrap();
        let record = VolumeSignal::from_series(&series).unwrap().to_record();
        let columns: Vec<&str> = record.columns().collect();
        assert_eq!(columns[0], "symbol");
        assert_eq!(&columns[1..], &COLUMNS[..]);
        assert_eq!(record.get("action"), Some(&Cell::Bool(false)));
        assert_eq!(record.get("current volume"), Some(&Cell::Integer(100)));
    }
}
