//! INI file configuration adapter.

use crate::domain::error::StockscanError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StockscanError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| StockscanError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, StockscanError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| StockscanError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
path = /srv/prices
exchange = NS

[batch]
workers = 4
max_lookback = 100

[ema]
smoothing = 2.0
seeding = legacy

[dma]
turnover_scale = 10000000
"#;

    #[test]
    fn reads_strings_across_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "path"),
            Some("/srv/prices".to_string())
        );
        assert_eq!(
            adapter.get_string("ema", "seeding"),
            Some("legacy".to_string())
        );
        assert_eq!(adapter.get_string("data", "missing"), None);
        assert_eq!(adapter.get_string("missing", "path"), None);
    }

    #[test]
    fn typed_getters_parse_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_int("batch", "workers", 1), 4);
        assert_eq!(adapter.get_double("ema", "smoothing", 0.0), 2.0);
        assert_eq!(adapter.get_double("dma", "turnover_scale", 0.0), 1e7);
    }

    #[test]
    fn typed_getters_fall_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[batch]\nworkers = many\n[ema]\nsmoothing = x\n")
                .unwrap();
        assert_eq!(adapter.get_int("batch", "workers", 3), 3);
        assert_eq!(adapter.get_int("batch", "max_lookback", 100), 100);
        assert_eq!(adapter.get_double("ema", "smoothing", 2.0), 2.0);
    }

    #[test]
    fn bool_accepts_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[report]\na = true\nb = No\nc = on\nd = maybe\n")
                .unwrap();
        assert!(adapter.get_bool("report", "a", false));
        assert!(!adapter.get_bool("report", "b", true));
        assert!(adapter.get_bool("report", "c", false));
        assert!(adapter.get_bool("report", "d", true));
        assert!(!adapter.get_bool("report", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[report]\noutput_dir = /tmp/reports\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("/tmp/reports".to_string())
        );
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/stockscan.ini");
        assert!(matches!(result, Err(StockscanError::ConfigParse { .. })));
    }
}
