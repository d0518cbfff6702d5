//! Typed run settings read from configuration.

use crate::domain::config_validation::validate_config;
use crate::domain::date_resolver::{DEFAULT_MAX_LOOKBACK, DateResolver};
use crate::domain::error::StockscanError;
use crate::domain::indicator::ema::{DEFAULT_SMOOTHING, EmaParams, EmaSeeding, LEGACY_SEED_OFFSET};
use crate::domain::indicator::ratio::DEFAULT_OUTCOME_CUTOFF;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_EXCHANGE: &str = "NS";
pub const DEFAULT_CROSSOVER_BAND: f64 = 1.0;
/// Turnover is reported in crore (1e7 rupees).
pub const DEFAULT_TURNOVER_SCALE: f64 = 1e7;
pub const DEFAULT_TURNOVER_FLOOR: f64 = 1.0;

/// Liquidity gate for the band indicators: `turnover / scale` must exceed
/// `floor` before a buy/sell/no-action call is made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnoverGate {
    pub scale: f64,
    pub floor: f64,
}

impl Default for TurnoverGate {
    fn default() -> Self {
        Self {
            scale: DEFAULT_TURNOVER_SCALE,
            floor: DEFAULT_TURNOVER_FLOOR,
        }
    }
}

/// Parameters shared by every unit computation in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub ema: EmaParams,
    pub outcome_cutoff: f64,
    pub crossover_band: f64,
    pub turnover: TurnoverGate,
    pub max_lookback: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            ema: EmaParams::default(),
            outcome_cutoff: DEFAULT_OUTCOME_CUTOFF,
            crossover_band: DEFAULT_CROSSOVER_BAND,
            turnover: TurnoverGate::default(),
            max_lookback: DEFAULT_MAX_LOOKBACK,
        }
    }
}

impl AnalysisSettings {
    pub fn resolver(&self) -> DateResolver {
        DateResolver::new(self.max_lookback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_path: PathBuf,
    pub exchange: String,
    /// `None` leaves the pool size to the batch runner.
    pub workers: Option<usize>,
    pub output_dir: PathBuf,
    /// Print reports as CSV on stdout instead of writing files.
    pub to_stdout: bool,
    pub symbol_codes: Option<String>,
    pub symbol_file: Option<PathBuf>,
    pub analysis: AnalysisSettings,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockscanError> {
        validate_config(config)?;

        let data_path = config
            .get_string("data", "path")
            .map(PathBuf::from)
            .ok_or_else(|| StockscanError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            })?;
        let exchange = config
            .get_string("data", "exchange")
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string());

        let workers = config
            .get_string("batch", "workers")
            .map(|_| config.get_int("batch", "workers", 1) as usize);
        let max_lookback = config.get_int("batch", "max_lookback", i64::from(DEFAULT_MAX_LOOKBACK)) as u32;

        let seeding = match config.get_string("ema", "seeding") {
            Some(s) => s
                .parse::<EmaSeeding>()
                .map_err(|reason| StockscanError::ConfigInvalid {
                    section: "ema".to_string(),
                    key: "seeding".to_string(),
                    reason,
                })?,
            None => EmaSeeding::default(),
        };
        let seeding = match seeding {
            EmaSeeding::FixedOffset(_) => EmaSeeding::FixedOffset(
                config.get_int("ema", "seed_offset", LEGACY_SEED_OFFSET as i64) as usize,
            ),
            EmaSeeding::Period => EmaSeeding::Period,
        };

        let analysis = AnalysisSettings {
            ema: EmaParams {
                smoothing: config.get_double("ema", "smoothing", DEFAULT_SMOOTHING),
                seeding,
            },
            outcome_cutoff: config.get_double("ema", "outcome_cutoff", DEFAULT_OUTCOME_CUTOFF),
            crossover_band: config.get_double("ema", "crossover_band", DEFAULT_CROSSOVER_BAND),
            turnover: TurnoverGate {
                scale: config.get_double("dma", "turnover_scale", DEFAULT_TURNOVER_SCALE),
                floor: config.get_double("dma", "turnover_floor", DEFAULT_TURNOVER_FLOOR),
            },
            max_lookback,
        };

        Ok(Self {
            data_path,
            exchange,
            workers,
            output_dir: config
                .get_string("report", "output_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            to_stdout: config.get_bool("report", "stdout", false),
            symbol_codes: config.get_string("symbols", "codes"),
            symbol_file: config.get_string("symbols", "file").map(PathBuf::from),
            analysis,
        })
    }
}
