//! Market data access port.

use crate::domain::error::StockscanError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::quote::QuoteRecord;
use chrono::NaiveDate;

/// Source of price history and quotes.
///
/// Shared by reference across worker threads, hence `Send + Sync`.
/// A symbol the source does not know is reported as [`StockscanError::NoData`].
pub trait DataPort: Send + Sync {
    /// Bars with `start <= date <= end`.
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, StockscanError>;

    /// Every bar the source holds for `symbol`.
    fn fetch_full_history(&self, symbol: &str) -> Result<PriceSeries, StockscanError>;

    fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, StockscanError>;

    fn list_symbols(&self) -> Result<Vec<String>, StockscanError>;
}
