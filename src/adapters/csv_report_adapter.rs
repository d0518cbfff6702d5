//! CSV report writer.

use crate::domain::error::StockscanError;
use crate::domain::report::BatchReport;
use crate::ports::report_port::ReportPort;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::info;

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

impl ReportPort for CsvReportAdapter {
    /// Creates the output directory when needed and overwrites any existing
    /// file of the same name.
    fn write(&self, report: &BatchReport, file_name: &str) -> Result<PathBuf, StockscanError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        let file = File::create(&path)?;
        report.write_csv(BufWriter::new(file))?;
        info!(path = %path.display(), rows = report.len(), "report written");
        Ok(path)
    }
}
