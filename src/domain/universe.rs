//! Symbol universe: the list of tickers a batch runs over.
//!
//! Symbols come either from a comma-separated list (CLI or `[symbols] codes`)
//! or from a file with one symbol per line.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("symbol list is empty")]
    Empty,

    #[error("cannot read symbol file {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Parses `ADANIGREEN, hdfcamc,WHIRLPOOL` into upper-cased symbols.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    collect_unique(input.split(','))
}

/// One symbol per line. Blank lines and lines starting with `#` are skipped.
pub fn load_symbol_file(path: &Path) -> Result<Vec<String>, UniverseError> {
    let content = fs::read_to_string(path).map_err(|e| UniverseError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    collect_unique(
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

fn collect_unique<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(symbols)
}
