//! Report output port.

use crate::domain::error::StockscanError;
use crate::domain::report::BatchReport;
use std::path::PathBuf;

pub trait ReportPort {
    /// Persists `report` under `file_name` and returns where it was written.
    fn write(&self, report: &BatchReport, file_name: &str) -> Result<PathBuf, StockscanError>;
}
