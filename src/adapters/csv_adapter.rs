//! CSV file data adapter.
//!
//! Layout under the base directory:
//! - `{SYMBOL}_{EXCHANGE}.csv` with `date,open,high,low,close,adj_close,volume`
//! - `quotes_{EXCHANGE}.csv` with one camelCase quote row per symbol

use crate::domain::error::StockscanError;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::domain::quote::QuoteRecord;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const QUOTES_PREFIX: &str = "quotes_";

/// Raw history row. Vendors leave prices empty on suspended days.
#[derive(Debug, Deserialize)]
struct BarRow {
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    adj_close: Option<f64>,
    volume: Option<f64>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
    exchange: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, exchange: impl Into<String>) -> Self {
        Self {
            base_path,
            exchange: exchange.into(),
        }
    }

    fn history_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, self.exchange))
    }

    fn quotes_path(&self) -> PathBuf {
        self.base_path
            .join(format!("{}{}.csv", QUOTES_PREFIX, self.exchange))
    }

    fn read_file(&self, path: &Path, symbol: &str) -> Result<String, StockscanError> {
        fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StockscanError::NoData {
                symbol: symbol.to_string(),
            },
            _ => StockscanError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            },
        })
    }

    /// Bars accepted by `keep`, in date order.
    fn read_bars(
        &self,
        symbol: &str,
        keep: impl Fn(NaiveDate) -> bool,
    ) -> Result<PriceSeries, StockscanError> {
        let path = self.history_path(symbol);
        let content = self.read_file(&path, symbol)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<BarRow>().enumerate() {
            let row = result.map_err(|e| StockscanError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
                StockscanError::DataSource {
                    reason: format!("invalid date '{}' in {}: {}", row.date, path.display(), e),
                }
            })?;
            if !keep(date) {
                continue;
            }

            let (Some(close), Some(volume)) = (row.close, row.volume) else {
                warn!(symbol, %date, line = line + 2, "skipping bar without close or volume");
                continue;
            };
            bars.push(PriceBar {
                date,
                open: row.open.unwrap_or(close),
                high: row.high.unwrap_or(close),
                low: row.low.unwrap_or(close),
                close,
                adj_close: row.adj_close.unwrap_or(close),
                volume: volume as i64,
            });
        }

        debug!(symbol, bars = bars.len(), "loaded price history");
        PriceSeries::new(symbol, bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, StockscanError> {
        self.read_bars(symbol, |date| date >= start && date <= end)
    }

    fn fetch_full_history(&self, symbol: &str) -> Result<PriceSeries, StockscanError> {
        self.read_bars(symbol, |_| true)
    }

    fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, StockscanError> {
        let path = self.quotes_path();
        let content = self.read_file(&path, symbol)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        for result in rdr.deserialize::<QuoteRecord>() {
            let quote = result.map_err(|e| StockscanError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            if quote.symbol.eq_ignore_ascii_case(symbol) {
                return Ok(quote);
            }
        }

        Err(StockscanError::NoData {
            symbol: symbol.to_string(),
        })
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockscanError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", self.exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StockscanError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(QUOTES_PREFIX) {
                continue;
            }
            if let Some(symbol) = name.strip_suffix(&suffix) {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
