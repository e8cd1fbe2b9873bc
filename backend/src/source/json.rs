//! JSON loading: a top-level array of record objects.

use std::path::Path;

use serde_json::Value;

use crate::error::{SourceError, SourceResult};
use crate::models::Table;

pub fn load_json(path: &Path) -> SourceResult<Table> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

pub fn parse_str(content: &str) -> SourceResult<Table> {
    let value: Value = serde_json::from_str(content)?;
    let records = value.as_array().ok_or_else(|| {
        SourceError::InvalidFormat("expected an array of record objects".to_string())
    })?;
    if let Some(position) = records.iter().position(|r| !r.is_object()) {
        return Err(SourceError::InvalidFormat(format!(
            "element {} is not an object",
            position
        )));
    }
    Ok(Table::from_records(records)?)
}
