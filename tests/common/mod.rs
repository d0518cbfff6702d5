#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use stockscan::domain::batch::BatchRunner;
use stockscan::domain::error::StockscanError;
pub use stockscan::domain::ohlcv::{PriceBar, PriceSeries};
pub use stockscan::domain::quote::QuoteRecord;
use stockscan::domain::settings::AnalysisSettings;
use stockscan::ports::data_port::DataPort;
use std::collections::HashMap;
use tracing::Dispatch;

/// In-memory data source. Symbols without bars are unknown (`NoData`);
/// symbols registered with an error fail with `DataSource`.
pub struct MockDataPort {
    pub bars: HashMap<String, Vec<PriceBar>>,
    pub quotes: HashMap<String, QuoteRecord>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: HashMap::new(),
            quotes: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    /// Bars plus a quote named after the symbol, priced at the last close.
    pub fn with_symbol(self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        let price = bars.last().map(|b| b.close).unwrap_or(0.0);
        let name = format!("{symbol} Limited");
        self.with_bars(symbol, bars)
            .with_quote(QuoteRecord::new(symbol, name, price))
    }

    /// Bars plus a quote with every optional field filled in.
    pub fn with_listed_symbol(self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        let price = bars.last().map(|b| b.close).unwrap_or(0.0);
        self.with_bars(symbol, bars)
            .with_quote(full_quote(symbol, price))
    }

    pub fn with_quote(mut self, quote: QuoteRecord) -> Self {
        self.quotes.insert(quote.symbol.clone(), quote);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), StockscanError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(StockscanError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn series(
        &self,
        symbol: &str,
        keep: impl Fn(NaiveDate) -> bool,
    ) -> Result<PriceSeries, StockscanError> {
        self.check(symbol)?;
        let bars = self.bars.get(symbol).ok_or_else(|| StockscanError::NoData {
            symbol: symbol.to_string(),
        })?;
        let bars = bars.iter().filter(|b| keep(b.date)).cloned().collect();
        PriceSeries::new(symbol, bars)
    }
}

impl DataPort for MockDataPort {
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, StockscanError> {
        self.series(symbol, |d| d >= start && d <= end)
    }

    fn fetch_full_history(&self, symbol: &str) -> Result<PriceSeries, StockscanError> {
        self.series(symbol, |_| true)
    }

    fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, StockscanError> {
        self.check(symbol)?;
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| StockscanError::NoData {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockscanError> {
        let mut symbols: Vec<String> = self.bars.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One bar per weekday from `start` through `end`. `close(i)` prices the
/// i-th bar, `volume(i)` sizes it.
pub fn weekday_bars(
    start: NaiveDate,
    end: NaiveDate,
    close: impl Fn(usize) -> f64,
    volume: impl Fn(usize) -> i64,
) -> Vec<PriceBar> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .enumerate()
        .map(|(i, date)| {
            let c = close(i);
            PriceBar {
                date,
                open: c - 1.0,
                high: c + 1.0,
                low: c - 2.0,
                close: c,
                adj_close: c,
                volume: volume(i),
            }
        })
        .collect()
}

/// Steady compounding from `start_price` at `daily_growth` per bar.
pub fn growth_bars(
    start: NaiveDate,
    end: NaiveDate,
    start_price: f64,
    daily_growth: f64,
) -> Vec<PriceBar> {
    weekday_bars(
        start,
        end,
        |i| start_price * (1.0 + daily_growth).powi(i as i32),
        |i| 500_000 + (i as i64 % 7) * 10_000,
    )
}

/// Quote with every field populated, derived from `price`.
pub fn full_quote(symbol: &str, price: f64) -> QuoteRecord {
    let low = price * 0.7;
    let high = price * 1.2;
    QuoteRecord {
        regular_market_volume: Some(1_250_000),
        market_cap: Some(450_000_000_000),
        book_value: Some(price / 4.0),
        price_to_book: Some(4.0),
        average_daily_volume_3_month: Some(1_100_000),
        average_daily_volume_10_day: Some(1_300_000),
        fifty_two_week_low_change: Some(price - low),
        fifty_two_week_low_change_percent: Some((price - low) / low),
        fifty_two_week_range: Some(format!("{low:.2} - {high:.2}")),
        fifty_two_week_high_change: Some(price - high),
        fifty_two_week_high_change_percent: Some((price - high) / high),
        fifty_two_week_low: Some(low),
        fifty_two_week_high: Some(high),
        ..QuoteRecord::new(symbol, format!("{symbol} Limited"), price)
    }
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Runner with two workers and logging discarded.
pub fn runner(data: &MockDataPort, today: NaiveDate) -> BatchRunner<'_> {
    BatchRunner::new(
        data,
        AnalysisSettings::default(),
        today,
        Some(2),
        Dispatch::none(),
    )
    .unwrap()
}
