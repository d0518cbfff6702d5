//! Configuration validation.
//!
//! Checks every section before any data is fetched, so a bad value fails the
//! run up front instead of turning every symbol into a placeholder row.

use crate::domain::error::StockscanError;
use crate::domain::indicator::ema::EmaSeeding;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    validate_data_path(config)?;
    validate_exchange(config)?;
    validate_workers(config)?;
    validate_max_lookback(config)?;
    validate_smoothing(config)?;
    validate_seeding(config)?;
    validate_outcome_cutoff(config)?;
    validate_crossover_band(config)?;
    validate_turnover(config)?;
    validate_report_stdout(config)?;
    validate_symbols(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> StockscanError {
    StockscanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StockscanError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_exchange(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    match config.get_string("data", "exchange") {
        Some(s) if s.trim().is_empty() => Err(invalid("data", "exchange", "exchange must not be empty")),
        Some(s) if !s.trim().chars().all(|c| c.is_ascii_alphanumeric()) => Err(invalid(
            "data",
            "exchange",
            "exchange must be alphanumeric",
        )),
        _ => Ok(()),
    }
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    if config.get_string("batch", "workers").is_none() {
        return Ok(());
    }
    let value = config.get_int("batch", "workers", 0);
    if value < 1 {
        return Err(invalid("batch", "workers", "workers must be at least 1"));
    }
    Ok(())
}

fn validate_max_lookback(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    let value = config.get_int("batch", "max_lookback", 100);
    if !(1..=3660).contains(&value) {
        return Err(invalid(
            "batch",
            "max_lookback",
            "max_lookback must be between 1 and 3660 days",
        ));
    }
    Ok(())
}

fn validate_smoothing(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    let value = config.get_double("ema", "smoothing", 2.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid("ema", "smoothing", "smoothing must be positive"));
    }
    Ok(())
}

fn validate_seeding(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    if let Some(s) = config.get_string("ema", "seeding") {
        s.parse::<EmaSeeding>()
            .map_err(|reason| invalid("ema", "seeding", &reason))?;
    }
    let offset = config.get_int("ema", "seed_offset", 50);
    if offset < 0 {
        return Err(invalid("ema", "seed_offset", "seed_offset must be non-negative"));
    }
    Ok(())
}

fn validate_outcome_cutoff(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    let value = config.get_double("ema", "outcome_cutoff", 5.0);
    if value <= 0.0 {
        return Err(invalid("ema", "outcome_cutoff", "outcome_cutoff must be positive"));
    }
    Ok(())
}

fn validate_crossover_band(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    let value = config.get_double("ema", "crossover_band", 1.0);
    if value <= 0.0 {
        return Err(invalid("ema", "crossover_band", "crossover_band must be positive"));
    }
    Ok(())
}

fn validate_turnover(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    let scale = config.get_double("dma", "turnover_scale", 1e7);
    if scale <= 0.0 {
        return Err(invalid("dma", "turnover_scale", "turnover_scale must be positive"));
    }
    let floor = config.get_double("dma", "turnover_floor", 1.0);
    if floor < 0.0 {
        return Err(invalid("dma", "turnover_floor", "turnover_floor must be non-negative"));
    }
    Ok(())
}

fn validate_report_stdout(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    if config.get_string("report", "stdout").is_none() {
        return Ok(());
    }
    // An unparsable value falls back to whichever default is passed in.
    if config.get_bool("report", "stdout", true) != config.get_bool("report", "stdout", false) {
        return Err(invalid("report", "stdout", "stdout must be a boolean"));
    }
    Ok(())
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), StockscanError> {
    let codes = config.get_string("symbols", "codes");
    let file = config.get_string("symbols", "file");

    match (codes, file) {
        (Some(c), Some(f)) if !c.trim().is_empty() && !f.trim().is_empty() => Err(invalid(
            "symbols",
            "codes",
            "set either codes or file, not both",
        )),
        (Some(c), _) if c.trim().is_empty() => {
            Err(invalid("symbols", "codes", "codes must not be empty"))
        }
        _ => Ok(()),
    }
}
