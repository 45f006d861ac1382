use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One input record. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct PageRecord {
    page: String,
}

/// Reads the page list. Duplicates are kept; the scanner dedupes.
pub fn load_pages(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read input {}", path.display()))?;
    let records: Vec<PageRecord> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse input {}", path.display()))?;
    Ok(records.into_iter().map(|record| record.page).collect())
}
