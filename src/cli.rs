//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::batch::{BatchRunner, ReportRequest};
use crate::domain::error::StockscanError;
use crate::domain::indicator::Cutoff;
use crate::domain::settings::Settings;
use crate::domain::unit::band::{DEFAULT_BAND_PERCENT, DEFAULT_EMA_PERIOD, DEFAULT_SMA_PERIOD};
use crate::domain::unit::multi::IndicatorChoice;
use crate::domain::unit::volume::DEFAULT_DURATION_DAYS;
use crate::domain::universe::{UniverseError, load_symbol_file, parse_symbols};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stockscan", about = "Batch technical-indicator screener")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every report command.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Comma-separated symbols, overriding the configured list
    #[arg(long, conflicts_with = "symbols_file")]
    pub codes: Option<String>,
    /// File with one symbol per line
    #[arg(long)]
    pub symbols_file: Option<PathBuf>,
    /// Output directory, overriding [report] output_dir
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Write the report to stdout instead of a file, like [report] stdout
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Latest volume against its mean over the last N days
    Volume {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value_t = DEFAULT_DURATION_DAYS)]
        duration: u32,
    },
    /// Two-period EMA comparison
    Ema {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value_t = 50)]
        short: usize,
        #[arg(long, default_value_t = 200)]
        long: usize,
        /// `today` or dd/mm/yyyy
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        cutoff: Cutoff,
    },
    /// Two-period EMA comparison joined with quote details
    EmaDetail {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value_t = 50)]
        short: usize,
        #[arg(long, default_value_t = 200)]
        long: usize,
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        cutoff: Cutoff,
    },
    /// Three-period EMA convergence joined with quote details
    EmaCrossover {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value_t = 5)]
        fast: usize,
        #[arg(long, default_value_t = 13)]
        medium: usize,
        #[arg(long, default_value_t = 26)]
        slow: usize,
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        cutoff: Cutoff,
    },
    /// Yearly and monthly momentum, best N by yearly return
    Momentum {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        end: Cutoff,
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Momentum leaders with their EMA pair
    MomentumEma {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        end: Cutoff,
        #[arg(long, default_value_t = 20)]
        top: usize,
        #[arg(long, default_value_t = 50)]
        short: usize,
        #[arg(long, default_value_t = 200)]
        long: usize,
    },
    /// Price against a band around the daily moving average
    Dma {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        end: Cutoff,
        #[arg(long, default_value_t = DEFAULT_SMA_PERIOD)]
        period: usize,
        /// Band half-width in percent
        #[arg(long, default_value_t = DEFAULT_BAND_PERCENT)]
        band: f64,
    },
    /// Price against a band around the exponential moving average
    EmaAbsolute {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "today", value_parser = parse_cutoff)]
        cutoff: Cutoff,
        #[arg(long, default_value_t = DEFAULT_EMA_PERIOD)]
        period: usize,
        #[arg(long, default_value_t = DEFAULT_BAND_PERCENT)]
        band: f64,
    },
    /// Several band indicators side by side
    Multi {
        #[command(flatten)]
        common: CommonArgs,
        /// Comma-separated: dma, ema
        #[arg(long, value_delimiter = ',', default_value = "dma,ema")]
        indicators: Vec<IndicatorChoice>,
    },
    /// Quote details
    Quote {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Accepts `today` or a `dd/mm/yyyy` date.
pub fn parse_cutoff(value: &str) -> Result<Cutoff, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("today") {
        return Ok(Cutoff::Latest);
    }
    NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .map(Cutoff::On)
        .map_err(|e| format!("expected 'today' or dd/mm/yyyy, got '{value}': {e}"))
}

/// stderr subscriber filtered by `RUST_LOG`, else `info` (`debug` when verbose).
pub fn build_dispatch(verbose: bool) -> Dispatch {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_thread_names(true)
        .finish();
    Dispatch::new(subscriber)
}

impl Command {
    /// The report a command asks for, with the options it carries.
    pub fn report(&self) -> Option<(&CommonArgs, ReportRequest)> {
        let pair = match self {
            Command::Volume { common, duration } => {
                (common, ReportRequest::VolumeNDays { duration: *duration })
            }
            Command::Ema {
                common,
                short,
                long,
                cutoff,
            } => (
                common,
                ReportRequest::Ema {
                    periods: (*short, *long),
                    cutoff: *cutoff,
                },
            ),
            Command::EmaDetail {
                common,
                short,
                long,
                cutoff,
            } => (
                common,
                ReportRequest::EmaDetail {
                    periods: (*short, *long),
                    cutoff: *cutoff,
                },
            ),
            Command::EmaCrossover {
                common,
                fast,
                medium,
                slow,
                cutoff,
            } => (
                common,
                ReportRequest::EmaCrossover {
                    periods: (*fast, *medium, *slow),
                    cutoff: *cutoff,
                },
            ),
            Command::Momentum { common, end, top } => (
                common,
                ReportRequest::RelativeMomentum {
                    end: *end,
                    top: *top,
                },
            ),
            Command::MomentumEma {
                common,
                end,
                top,
                short,
                long,
            } => (
                common,
                ReportRequest::RelativeMomentumEma {
                    end: *end,
                    top: *top,
                    periods: (*short, *long),
                },
            ),
            Command::Dma {
                common,
                end,
                period,
                band,
            } => (
                common,
                ReportRequest::AbsoluteMomentumDma {
                    end: *end,
                    period: *period,
                    band: *band,
                },
            ),
            Command::EmaAbsolute {
                common,
                cutoff,
                period,
                band,
            } => (
                common,
                ReportRequest::EmaAbsolute {
                    cutoff: *cutoff,
                    period: *period,
                    band: *band,
                },
            ),
            Command::Multi { common, indicators } => (
                common,
                ReportRequest::MultiChoice {
                    choices: indicators.clone(),
                },
            ),
            Command::Quote { common } => (common, ReportRequest::Quote),
            Command::ListSymbols { .. } | Command::Validate { .. } => return None,
        };
        Some(pair)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let dispatch = build_dispatch(cli.verbose);
    let result = match &cli.command {
        Command::ListSymbols { config } => run_list_symbols(config),
        Command::Validate { config } => run_validate(config),
        command => match command.report() {
            Some((common, request)) => {
                let today = Local::now().date_naive();
                run_report(common, &request, today, dispatch).map(|written| {
                    if let Some(path) = written {
                        eprintln!("Report written to: {}", path.display());
                    }
                })
            }
            None => Ok(()),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, StockscanError> {
    let config = FileConfigAdapter::from_file(path)?;
    Settings::from_config(&config)
}

/// Command-line symbols win over the configured ones; an explicit list wins
/// over a file.
pub fn resolve_symbols(common: &CommonArgs, settings: &Settings) -> Result<Vec<String>, StockscanError> {
    let symbols = if let Some(codes) = &common.codes {
        parse_symbols(codes)?
    } else if let Some(file) = &common.symbols_file {
        load_symbol_file(file)?
    } else if let Some(codes) = &settings.symbol_codes {
        parse_symbols(codes)?
    } else if let Some(file) = &settings.symbol_file {
        load_symbol_file(file)?
    } else {
        return Err(UniverseError::Empty.into());
    };
    Ok(symbols)
}

/// Runs one report and writes it out. Returns the file path, or `None` when
/// the report went to stdout.
pub fn run_report(
    common: &CommonArgs,
    request: &ReportRequest,
    today: NaiveDate,
    dispatch: Dispatch,
) -> Result<Option<PathBuf>, StockscanError> {
    let settings = load_settings(&common.config)?;
    let symbols = resolve_symbols(common, &settings)?;
    let data = CsvAdapter::new(settings.data_path.clone(), settings.exchange.clone());
    let runner = BatchRunner::new(&data, settings.analysis, today, settings.workers, dispatch)?;

    let report = runner.run(request, &symbols)?;
    if common.stdout || settings.to_stdout {
        report.write_csv(io::stdout().lock())?;
        return Ok(None);
    }

    let output_dir = common.output.clone().unwrap_or(settings.output_dir);
    let path = CsvReportAdapter::new(output_dir)
        .write(&report, &request.file_name(symbols.len(), today))?;
    Ok(Some(path))
}

fn run_list_symbols(config_path: &Path) -> Result<(), StockscanError> {
    let settings = load_settings(config_path)?;
    let data = CsvAdapter::new(settings.data_path, settings.exchange.clone());
    let symbols = data.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", settings.exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), StockscanError> {
    eprintln!("Validating config: {}", config_path.display());
    let settings = load_settings(config_path)?;

    eprintln!("  data:      {} ({})", settings.data_path.display(), settings.exchange);
    match settings.workers {
        Some(n) => eprintln!("  workers:   {n}"),
        None => eprintln!("  workers:   default"),
    }
    eprintln!("  seeding:   {}", settings.analysis.ema.seeding);
    eprintln!("  lookback:  {} days", settings.analysis.max_lookback);
    eprintln!("  output:    {}", settings.output_dir.display());

    if settings.symbol_codes.is_some() || settings.symbol_file.is_some() {
        let common = CommonArgs {
            config: config_path.to_path_buf(),
            codes: None,
            symbols_file: None,
            output: None,
            stdout: false,
        };
        let symbols = resolve_symbols(&common, &settings)?;
        eprintln!("  symbols:   {}", symbols.len());
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}
