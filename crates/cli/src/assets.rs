//! Asset list files: the query terms a pull tracks.
//!
//! Two layouts are accepted. A `.csv` file must have an `Asset` header
//! column; every other column is ignored. Any other file is read as plain
//! text with one term per line, where blank lines and `#` comments are
//! skipped.

use std::path::Path;

use crate::config::{extend_terms, ConfigError};

pub const ASSET_COLUMN: &str = "Asset";

pub fn read_asset_terms(path: &Path) -> Result<Vec<String>, ConfigError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let terms = if is_csv {
        read_csv_terms(path)?
    } else {
        read_text_terms(path)?
    };
    tracing::info!(path = %path.display(), terms = terms.len(), "read asset list");
    Ok(terms)
}

fn assets_error(path: &Path, message: impl ToString) -> ConfigError {
    ConfigError::Assets {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read_csv_terms(path: &Path) -> Result<Vec<String>, ConfigError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|e| assets_error(path, e))?;
    let column = rdr
        .headers()
        .map_err(|e| assets_error(path, e))?
        .iter()
        .position(|h| h.trim() == ASSET_COLUMN)
        .ok_or_else(|| assets_error(path, format!("missing '{}' column", ASSET_COLUMN)))?;

    let mut terms = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| assets_error(path, e))?;
        extend_terms(&mut terms, record.get(column));
    }
    Ok(terms)
}

fn read_text_terms(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| assets_error(path, e))?;
    let mut terms = Vec::new();
    extend_terms(
        &mut terms,
        content.lines().filter(|l| !l.trim_start().starts_with('#')),
    );
    Ok(terms)
}
