//! Domain error types.

use crate::domain::date_resolver::ResolveError;
use crate::domain::indicator::MathError;
use crate::domain::report::ReportError;
use crate::domain::universe::UniverseError;
use chrono::NaiveDate;

/// Top-level error type for stockscan.
#[derive(Debug, thiserror::Error)]
pub enum StockscanError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("duplicate date {date} in price series for {symbol}")]
    DuplicateDate { symbol: String, date: NaiveDate },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to build worker pool: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StockscanError> for std::process::ExitCode {
    fn from(err: &StockscanError) -> Self {
        let code: u8 = match err {
            StockscanError::Io(_) | StockscanError::WorkerPool { .. } => 1,
            StockscanError::ConfigParse { .. }
            | StockscanError::ConfigMissing { .. }
            | StockscanError::ConfigInvalid { .. }
            | StockscanError::Universe(_) => 2,
            StockscanError::DataSource { .. } | StockscanError::DuplicateDate { .. } => 3,
            StockscanError::NoData { .. } => 5,
            StockscanError::Report(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}

/// Failure of a single per-symbol computation.
///
/// Never aborts a batch: the orchestrator turns it into a row of missing
/// values for that symbol.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("insufficient history: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("quote unavailable: {reason}")]
    QuoteUnavailable { reason: String },

    #[error("no {indicator} value on {date}")]
    NoValueOn { indicator: String, date: NaiveDate },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Math(#[from] MathError),
}

impl From<StockscanError> for UnitError {
    fn from(err: StockscanError) -> Self {
        UnitError::DataUnavailable {
            reason: err.to_string(),
        }
    }
}
