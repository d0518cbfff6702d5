//! Point-in-time descriptive quote metadata for a symbol.

use crate::domain::record::{Cell, IndicatorRecord, SYMBOL_COLUMN};
use crate::domain::unit::UnitRow;
use serde::Deserialize;

/// Quote columns in report order, after `symbol`.
pub const QUOTE_COLUMNS: [&str; 15] = [
    "longName",
    "price",
    "regularMarketVolume",
    "marketCap",
    "bookValue",
    "priceToBook",
    "averageDailyVolume3Month",
    "averageDailyVolume10Day",
    "fiftyTwoWeekLowChange",
    "fiftyTwoWeekLowChangePercent",
    "fiftyTwoWeekRange",
    "fiftyTwoWeekHighChange",
    "fiftyTwoWeekHighChangePercent",
    "fiftyTwoWeekLow",
    "fiftyTwoWeekHigh",
];

/// Display name and price are always present; every other field may be absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub symbol: String,
    pub long_name: String,
    pub price: f64,
    #[serde(default)]
    pub regular_market_volume: Option<i64>,
    #[serde(default)]
    pub market_cap: Option<i64>,
    #[serde(default)]
    pub book_value: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,
    #[serde(default, rename = "averageDailyVolume3Month")]
    pub average_daily_volume_3_month: Option<i64>,
    #[serde(default, rename = "averageDailyVolume10Day")]
    pub average_daily_volume_10_day: Option<i64>,
    #[serde(default)]
    pub fifty_two_week_low_change: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low_change_percent: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_range: Option<String>,
    #[serde(default)]
    pub fifty_two_week_high_change: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high_change_percent: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
}

impl QuoteRecord {
    /// Minimal quote with only the mandatory fields set.
    pub fn new(symbol: impl Into<String>, long_name: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            long_name: long_name.into(),
            price,
            regular_market_volume: None,
            market_cap: None,
            book_value: None,
            price_to_book: None,
            average_daily_volume_3_month: None,
            average_daily_volume_10_day: None,
            fifty_two_week_low_change: None,
            fifty_two_week_low_change_percent: None,
            fifty_two_week_range: None,
            fifty_two_week_high_change: None,
            fifty_two_week_high_change_percent: None,
            fifty_two_week_low: None,
            fifty_two_week_high: None,
        }
    }
}

impl UnitRow for QuoteRecord {
    fn to_record(&self) -> IndicatorRecord {
        IndicatorRecord::new()
            .with(SYMBOL_COLUMN, Cell::text(&self.symbol))
            .with("longName", Cell::text(&self.long_name))
            .with("price", Cell::number(self.price))
            .with(
                "regularMarketVolume",
                Cell::optional_integer(self.regular_market_volume),
            )
            .with("marketCap", Cell::optional_integer(self.market_cap))
            .with("bookValue", Cell::optional_number(self.book_value))
            .with("priceToBook", Cell::optional_number(self.price_to_book))
            .with(
                "averageDailyVolume3Month",
                Cell::optional_integer(self.average_daily_volume_3_month),
            )
            .with(
                "averageDailyVolume10Day",
                Cell::optional_integer(self.average_daily_volume_10_day),
            )
            .with(
                "fiftyTwoWeekLowChange",
                Cell::optional_number(self.fifty_two_week_low_change),
            )
            .with(
                "fiftyTwoWeekLowChangePercent",
                Cell::optional_number(self.fifty_two_week_low_change_percent),
            )
            .with(
                "fiftyTwoWeekRange",
                Cell::optional_text(self.fifty_two_week_range.as_deref()),
            )
            .with(
                "fiftyTwoWeekHighChange",
                Cell::optional_number(self.fifty_two_week_high_change),
            )
            .with(
                "fiftyTwoWeekHighChangePercent",
                Cell::optional_number(self.fifty_two_week_high_change_percent),
            )
            .with("fiftyTwoWeekLow", Cell::optional_number(self.fifty_two_week_low))
            .with("fiftyTwoWeekHigh", Cell::optional_number(self.fifty_two_week_high))
    }
}
