//! Batch orchestration: fans a unit computation out over a symbol list on a
//! bounded worker pool, tabulates the outcomes and applies the per-report
//! cleanup, ranking and joins.

use crate::domain::date_resolver::ResolveError;
use crate::domain::error::{StockscanError, UnitError};
use crate::domain::indicator::Cutoff;
use crate::domain::quote::QUOTE_COLUMNS;
use crate::domain::record::{IndicatorRecord, SYMBOL_COLUMN};
use crate::domain::report::{self, BatchReport, CleanupPolicy, ReportError};
use crate::domain::settings::AnalysisSettings;
use crate::domain::unit::band::{self, BandAverage};
use crate::domain::unit::multi::{self, IndicatorChoice};
use crate::domain::unit::{UnitContext, UnitRow, crossover, ema, momentum, quote, volume};
use crate::ports::data_port::DataPort;
use chrono::{Months, NaiveDate};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{Dispatch, info, info_span, warn};

/// Minimum non-missing cells (symbol included) for a momentum row to survive.
pub const MOMENTUM_MIN_ROW_VALUES: usize = 3;
/// Minimum non-missing cells for a momentum column to survive.
pub const MOMENTUM_MIN_COLUMN_VALUES: usize = 2;
pub const BAND_MIN_ROW_VALUES: usize = 4;
pub const MULTI_MIN_ROW_VALUES: usize = 2;
pub const QUOTE_MIN_ROW_VALUES: usize = 3;

/// Worker count used when none is configured: one core is left to the caller.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Result of one unit computation, tagged with its symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome<T> {
    pub symbol: String,
    pub result: Result<T, UnitError>,
}

/// A batch report and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRequest {
    VolumeNDays {
        duration: u32,
    },
    Ema {
        periods: (usize, usize),
        cutoff: Cutoff,
    },
    EmaDetail {
        periods: (usize, usize),
        cutoff: Cutoff,
    },
    EmaCrossover {
        periods: (usize, usize, usize),
        cutoff: Cutoff,
    },
    RelativeMomentum {
        end: Cutoff,
        top: usize,
    },
    RelativeMomentumEma {
        end: Cutoff,
        top: usize,
        periods: (usize, usize),
    },
    AbsoluteMomentumDma {
        end: Cutoff,
        period: usize,
        band: f64,
    },
    EmaAbsolute {
        cutoff: Cutoff,
        period: usize,
        band: f64,
    },
    MultiChoice {
        choices: Vec<IndicatorChoice>,
    },
    Quote,
}

impl ReportRequest {
    pub fn indicator_name(&self) -> &'static str {
        match self {
            ReportRequest::VolumeNDays { .. } => "volume_indicator",
            ReportRequest::Ema { .. } => "ema_indicator",
            ReportRequest::EmaDetail { .. } => "ema_detail_indicator",
            ReportRequest::EmaCrossover { .. } => "ema_crossover_detail_indicator",
            ReportRequest::RelativeMomentum { .. } => "relative_momentum",
            ReportRequest::RelativeMomentumEma { .. } => "momentum_ema",
            ReportRequest::AbsoluteMomentumDma { .. } => "dma_action",
            ReportRequest::EmaAbsolute { .. } => "ema_action",
            ReportRequest::MultiChoice { .. } => "multi_choice_indicator",
            ReportRequest::Quote => "quote",
        }
    }

    /// Parameters rendered into the file name, in order.
    pub fn params(&self) -> Vec<String> {
        match self {
            ReportRequest::VolumeNDays { duration } => vec![duration.to_string()],
            ReportRequest::Ema { periods, .. }
            | ReportRequest::EmaDetail { periods, .. }
            | ReportRequest::RelativeMomentumEma { periods, .. } => {
                vec![periods.0.to_string(), periods.1.to_string()]
            }
            ReportRequest::EmaCrossover { periods, .. } => vec![
                periods.0.to_string(),
                periods.1.to_string(),
                periods.2.to_string(),
            ],
            ReportRequest::RelativeMomentum { top, .. } => vec![top.to_string()],
            ReportRequest::AbsoluteMomentumDma { period, band, .. }
            | ReportRequest::EmaAbsolute { period, band, .. } => {
                vec![period.to_string(), band.to_string()]
            }
            ReportRequest::MultiChoice { choices } => IndicatorChoice::ALL
                .iter()
                .filter(|c| choices.contains(c))
                .map(|c| match c {
                    IndicatorChoice::DailyMovingAverage => "dma".to_string(),
                    IndicatorChoice::ExponentialMovingAverage => "ema".to_string(),
                })
                .collect(),
            ReportRequest::Quote => Vec::new(),
        }
    }

    pub fn file_name(&self, count: usize, run_date: NaiveDate) -> String {
        report::file_name(self.indicator_name(), &self.params(), count, run_date)
    }
}

/// Runs unit computations for many symbols on a dedicated thread pool.
///
/// The logging dispatcher is injected and installed on each worker for the
/// duration of a unit, so library code never touches a global subscriber.
pub struct BatchRunner<'a> {
    data: &'a dyn DataPort,
    settings: AnalysisSettings,
    today: NaiveDate,
    pool: ThreadPool,
    dispatch: Dispatch,
}

impl<'a> BatchRunner<'a> {
    /// `workers` defaults to [`default_workers`].
    pub fn new(
        data: &'a dyn DataPort,
        settings: AnalysisSettings,
        today: NaiveDate,
        workers: Option<usize>,
        dispatch: Dispatch,
    ) -> Result<Self, StockscanError> {
        let workers = workers.unwrap_or_else(default_workers).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("stockscan-worker-{i}"))
            .build()
            .map_err(|e| StockscanError::WorkerPool {
                reason: e.to_string(),
            })?;

        Ok(Self {
            data,
            settings,
            today,
            pool,
            dispatch,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Applies `unit` to every symbol concurrently. Outcomes come back in
    /// input order; a failing unit never affects the others.
    pub fn run_batch<T, F>(&self, symbols: &[String], unit: F) -> Vec<UnitOutcome<T>>
    where
        T: Send,
        F: Fn(&UnitContext<'_>, &str) -> Result<T, UnitError> + Sync,
    {
        let ctx = UnitContext::new(self.data, &self.settings, self.today);
        self.pool.install(|| {
            symbols
                .par_iter()
                .map(|symbol| {
                    tracing::dispatcher::with_default(&self.dispatch, || {
                        let span = info_span!("unit", symbol = %symbol);
                        let _entered = span.enter();
                        UnitOutcome {
                            symbol: symbol.clone(),
                            result: unit(&ctx, symbol),
                        }
                    })
                })
                .collect()
        })
    }

    /// Runs a report end to end.
    pub fn run(&self, request: &ReportRequest, symbols: &[String]) -> Result<BatchReport, ReportError> {
        tracing::dispatcher::with_default(&self.dispatch, || {
            info!(
                report = request.indicator_name(),
                symbols = symbols.len(),
                workers = self.workers(),
                "running batch"
            );
            let report = match request {
                ReportRequest::VolumeNDays { duration } => Ok(self.volume_n_days(symbols, *duration)),
                ReportRequest::Ema { periods, cutoff } => {
                    Ok(self.ema_indicator(symbols, *periods, *cutoff))
                }
                ReportRequest::EmaDetail { periods, cutoff } => {
                    self.ema_detail_indicator(symbols, *periods, *cutoff)
                }
                ReportRequest::EmaCrossover { periods, cutoff } => {
                    self.ema_crossover_detail_indicator(symbols, *periods, *cutoff)
                }
                ReportRequest::RelativeMomentum { end, top } => {
                    self.relative_momentum(symbols, *end, *top)
                }
                ReportRequest::RelativeMomentumEma { end, top, periods } => {
                    self.relative_momentum_with_ema(symbols, *end, *top, *periods)
                }
                ReportRequest::AbsoluteMomentumDma { end, period, band } => {
                    Ok(self.absolute_momentum_with_dma(symbols, *end, *period, *band))
                }
                ReportRequest::EmaAbsolute { cutoff, period, band } => {
                    Ok(self.ema_absolute(symbols, *cutoff, *period, *band))
                }
                ReportRequest::MultiChoice { choices } => {
                    Ok(self.multi_choice_indicator(symbols, choices))
                }
                ReportRequest::Quote => Ok(self.quotes(symbols)),
            }?;
            info!(rows = report.len(), columns = report.columns().len(), "batch finished");
            Ok(report)
        })
    }

    pub fn volume_n_days(&self, symbols: &[String], duration: u32) -> BatchReport {
        let outcomes = self.run_batch(symbols, |ctx, symbol| volume::volume_n_days(ctx, symbol, duration));
        let mut report = tabulate(outcomes, &volume::COLUMNS);
        report.cleanup(CleanupPolicy::COMPLETE_ROWS);
        report
    }

    pub fn ema_indicator(&self, symbols: &[String], periods: (usize, usize), cutoff: Cutoff) -> BatchReport {
        let mut report = self.ema_table(symbols, periods, cutoff);
        report.cleanup(CleanupPolicy::COMPLETE_ROWS);
        report
    }

    /// EMA table for every symbol, placeholders included.
    fn ema_table(&self, symbols: &[String], periods: (usize, usize), cutoff: Cutoff) -> BatchReport {
        let outcomes = self.run_batch(symbols, |ctx, symbol| ema::ema_pair(ctx, symbol, periods, cutoff));
        tabulate(outcomes, &ema::columns(periods))
    }

    /// EMA pair for every symbol, then quote details for the symbols that
    /// survived, joined one-to-one on `symbol`.
    pub fn ema_detail_indicator(
        &self,
        symbols: &[String],
        periods: (usize, usize),
        cutoff: Cutoff,
    ) -> Result<BatchReport, ReportError> {
        let ema_report = self.ema_indicator(symbols, periods, cutoff);
        self.with_quotes(ema_report)
    }

    pub fn ema_crossover_detail_indicator(
        &self,
        symbols: &[String],
        periods: (usize, usize, usize),
        cutoff: Cutoff,
    ) -> Result<BatchReport, ReportError> {
        let outcomes = self.run_batch(symbols, |ctx, symbol| {
            crossover::ema_triple(ctx, symbol, periods, cutoff)
        });
        let mut crossover_report = tabulate(outcomes, &crossover::columns(periods));
        crossover_report.cleanup(CleanupPolicy::COMPLETE_ROWS);
        self.with_quotes(crossover_report)
    }

    /// Second phase of the detail reports. Runs only after the first phase
    /// has been collected and cleaned.
    fn with_quotes(&self, left: BatchReport) -> Result<BatchReport, ReportError> {
        let survivors = left.symbols();
        let quotes = self.quotes_table(&survivors);
        left.join_one_to_one(&quotes, SYMBOL_COLUMN)
    }

    /// Yearly and monthly momentum over the twelve months up to `end`,
    /// best `top` by yearly return.
    pub fn relative_momentum(&self, symbols: &[String], end: Cutoff, top: usize) -> Result<BatchReport, ReportError> {
        let end_date = end.label_date(self.today);
        let outcomes = self.run_batch(symbols, |ctx, symbol| {
            let start = end_date
                .checked_sub_months(Months::new(12))
                .ok_or(ResolveError::OutOfCalendar {
                    from: end_date,
                    years: 1,
                    months: 0,
                })?;
            momentum::momentum(ctx, symbol, start, end_date)
        });
        let mut report = tabulate(outcomes, &momentum::FIXED_COLUMNS);
        report.cleanup(
            CleanupPolicy::min_row_values(MOMENTUM_MIN_ROW_VALUES)
                .with_min_column_values(MOMENTUM_MIN_COLUMN_VALUES),
        );
        report.sort_by_desc("return_yearly")?;
        report.truncate(top);
        Ok(report)
    }

    /// Top momentum symbols with their EMA pair alongside.
    pub fn relative_momentum_with_ema(
        &self,
        symbols: &[String],
        end: Cutoff,
        top: usize,
        periods: (usize, usize),
    ) -> Result<BatchReport, ReportError> {
        let momentum_report = self.relative_momentum(symbols, end, top)?;
        let leaders = momentum_report.symbols();
        let ema_report = self.ema_table(&leaders, periods, end);
        momentum_report.join_one_to_one(&ema_report, SYMBOL_COLUMN)
    }

    pub fn absolute_momentum_with_dma(
        &self,
        symbols: &[String],
        end: Cutoff,
        period: usize,
        band_percent: f64,
    ) -> BatchReport {
        let outcomes = self.run_batch(symbols, |ctx, symbol| {
            band::dma_absolute(ctx, symbol, end, period, band_percent)
        });
        let as_of = end.label_date(self.today);
        let mut report = tabulate(outcomes, &band::columns(BandAverage::Sma, as_of));
        report.cleanup(CleanupPolicy::min_row_values(BAND_MIN_ROW_VALUES));
        report
    }

    pub fn ema_absolute(&self, symbols: &[String], cutoff: Cutoff, period: usize, band_percent: f64) -> BatchReport {
        let outcomes = self.run_batch(symbols, |ctx, symbol| {
            band::ema_absolute(ctx, symbol, cutoff, period, band_percent)
        });
        let as_of = cutoff.label_date(self.today);
        let mut report = tabulate(outcomes, &band::columns(BandAverage::Ema, as_of));
        report.cleanup(CleanupPolicy::min_row_values(BAND_MIN_ROW_VALUES));
        report
    }

    pub fn multi_choice_indicator(&self, symbols: &[String], choices: &[IndicatorChoice]) -> BatchReport {
        let outcomes = self.run_batch(symbols, |ctx, symbol| multi::multi_choice(ctx, symbol, choices));
        let mut report = tabulate(outcomes, &multi::columns(choices, self.today));
        report.cleanup(CleanupPolicy::min_row_values(MULTI_MIN_ROW_VALUES));
        report
    }

    /// Quote details; a row needs its symbol, display name and price.
    pub fn quotes(&self, symbols: &[String]) -> BatchReport {
        let mut report = self.quotes_table(symbols);
        report.cleanup(CleanupPolicy::min_row_values(QUOTE_MIN_ROW_VALUES));
        report
    }

    fn quotes_table(&self, symbols: &[String]) -> BatchReport {
        let outcomes = self.run_batch(symbols, quote::quote);
        tabulate(outcomes, &QUOTE_COLUMNS)
    }
}

/// Lays outcomes out as a report. A failed unit becomes a row holding only
/// its symbol, with `columns` present and missing. An empty batch still
/// carries the `symbol` + `columns` header.
pub fn tabulate<T, S>(outcomes: Vec<UnitOutcome<T>>, columns: &[S]) -> BatchReport
where
    T: UnitRow,
    S: AsRef<str>,
{
    if outcomes.is_empty() {
        let header: Vec<&str> = std::iter::once(SYMBOL_COLUMN)
            .chain(columns.iter().map(|c| c.as_ref()))
            .collect();
        return BatchReport::empty(&header);
    }
    let records: Vec<IndicatorRecord> = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(row) => row.to_record(),
            Err(err) => {
                warn!(symbol = %outcome.symbol, error = %err, "unit failed, keeping placeholder row");
                IndicatorRecord::placeholder(&outcome.symbol, columns)
            }
        })
        .collect();
    BatchReport::from_records(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Cell;
    use crate::domain::unit::volume::VolumeSignal;
    use crate::domain::unit::fixtures::date;

    fn signal(symbol: &str) -> VolumeSignal {
        VolumeSignal {
            symbol: symbol.to_string(),
            current_date: date(2022, 1, 3),
            start_date: date(2021, 10, 5),
            current_volume: 200,
            mean_volume: 100.0,
            close: 10.0,
            action: true,
        }
    }

    #[test]
    fn tabulate_keeps_failed_symbols_as_placeholders() {
        let outcomes = vec![
            UnitOutcome {
                symbol: "ABB".to_string(),
                result: Ok(signal("ABB")),
            },
            UnitOutcome {
                symbol: "ABCXYZ".to_string(),
                result: Err(UnitError::DataUnavailable {
                    reason: "no data".into(),
                }),
            },
        ];
        let report = tabulate(outcomes, &volume::COLUMNS);

        assert_eq!(report.len(), 2);
        assert_eq!(report.cell(1, "symbol"), Some(&Cell::text("ABCXYZ")));
        assert_eq!(report.cell(1, "action"), Some(&Cell::Missing));
        assert_eq!(report.columns().len(), 1 + volume::COLUMNS.len());
    }

    #[test]
    fn empty_batch_keeps_header() {
        let report = tabulate(Vec::<UnitOutcome<VolumeSignal>>::new(), &volume::COLUMNS);
        assert!(report.is_empty());
        assert_eq!(report.columns()[0], "symbol");
        assert_eq!(report.columns().len(), 1 + volume::COLUMNS.len());
    }

    #[test]
    fn file_names_carry_parameters() {
        let run_date = date(2022, 1, 1);
        assert_eq!(
            ReportRequest::Ema {
                periods: (50, 200),
                cutoff: Cutoff::Latest
            }
            .file_name(3, run_date),
            "ema_indicator50-200_3company_01-01-2022.csv"
        );
        assert_eq!(
            ReportRequest::EmaCrossover {
                periods: (5, 13, 26),
                cutoff: Cutoff::Latest
            }
            .file_name(10, run_date),
            "ema_crossover_detail_indicator5-13-26_10company_01-01-2022.csv"
        );
        assert_eq!(
            ReportRequest::AbsoluteMomentumDma {
                end: Cutoff::Latest,
                period: 200,
                band: 5.0
            }
            .file_name(2, run_date),
            "dma_action200-5_2company_01-01-2022.csv"
        );
        assert_eq!(
            ReportRequest::Quote.file_name(4, run_date),
            "quote_4company_01-01-2022.csv"
        );
    }

    #[test]
    fn default_workers_is_at_least_one() {
        assert!(default_workers() >= 1);
    }
}
