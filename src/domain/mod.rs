//! Core domain types and logic: date resolution, indicator math, per-symbol
//! units and the batch orchestrator.

pub mod batch;
pub mod config_validation;
pub mod date_resolver;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod quote;
pub mod record;
pub mod report;
pub mod settings;
pub mod unit;
pub mod universe;
