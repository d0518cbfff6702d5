//! Daily price bars and the per-symbol price series.

use crate::domain::error::StockscanError;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}

/// Trading-date indexed history for one symbol.
///
/// Dates are strictly increasing. Gaps (weekends, holidays, vendor holes)
/// are expected and carry no meaning.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    /// Sorts `bars` by date. Two bars on the same date are rejected.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self, StockscanError> {
        let symbol = symbol.into();
        bars.sort_by_key(|b| b.date);

        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(StockscanError::DuplicateDate {
                symbol,
                date: pair[0].date,
            });
        }

        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();

        Ok(Self {
            symbol,
            bars,
            date_index,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.date_index.contains_key(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    /// The last `n` bars, or all of them when the series is shorter.
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adj_close: close,
            volume: 1000,
        }
    }

    #[test]
    fn new_sorts_and_indexes() {
        let series = PriceSeries::new(
            "HDFCAMC",
            vec![
                bar("2024-01-03", 102.0),
                bar("2024-01-01", 100.0),
                bar("2024-01-02", 101.0),
            ],
        )
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(
            series.first_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(
            series.last_date(),
            Some(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap())
        );
        assert!(series.contains(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let result = PriceSeries::new(
            "HDFCAMC",
            vec![bar("2024-01-01", 100.0), bar("2024-01-01", 101.0)],
        );
        assert!(matches!(
            result,
            Err(StockscanError::DuplicateDate { symbol, .. }) if symbol == "HDFCAMC"
        ));
    }

    #[test]
    fn get_returns_bar_for_trading_date_only() {
        let series = PriceSeries::new(
            "ABB",
            vec![bar("2024-01-05", 50.0), bar("2024-01-08", 51.0)],
        )
        .unwrap();

        let friday = series.get(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!((friday.unwrap().close - 50.0).abs() < f64::EPSILON);
        assert!(series
            .get(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap())
            .is_none());
    }

    #[test]
    fn tail_is_clamped_to_length() {
        let series = PriceSeries::new(
            "ABB",
            vec![bar("2024-01-01", 1.0), bar("2024-01-02", 2.0)],
        )
        .unwrap();
        assert_eq!(series.tail(1).len(), 1);
        assert_eq!(series.tail(10).len(), 2);
        assert!((series.tail(1)[0].close - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_series_has_no_dates() {
        let series = PriceSeries::new("ABCXYZ", vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.first_date(), None);
        assert_eq!(series.last(), None);
    }
}
