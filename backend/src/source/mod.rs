//! Loading the initial table.
//!
//! ```text
//! "ventas.csv"   ──▶ csv  (auto encoding + delimiter)
//! "ventas.xlsx"  ──▶ xlsx (first worksheet)
//! "ventas.json"  ──▶ json (array of records)
//! anything else  ──▶ query: no connector bundled → SourceUnavailable
//! ```
//!
//! Library callers with a database can plug in their own [`Loader`].

pub mod csv;
pub mod json;
pub mod xlsx;

use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::Table;

/// Anything that can turn a source string into a table.
pub trait Loader {
    fn load(&self, source: &str) -> SourceResult<Table>;
}

/// Loads CSV, XLSX and JSON files by extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

/// Supported file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Xlsx,
    Json,
    Query,
}

impl SourceKind {
    pub fn detect(source: &str) -> Self {
        let extension = Path::new(source.trim())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match extension.as_deref() {
            Some("csv") => SourceKind::Csv,
            Some("xlsx") | Some("xlsm") => SourceKind::Xlsx,
            Some("json") => SourceKind::Json,
            _ => SourceKind::Query,
        }
    }
}

impl Loader for FileLoader {
    fn load(&self, source: &str) -> SourceResult<Table> {
        let path = Path::new(source.trim());
        match SourceKind::detect(source) {
            SourceKind::Csv => csv::load_csv(path),
            SourceKind::Xlsx => xlsx::load_xlsx(path),
            SourceKind::Json => json::load_json(path),
            SourceKind::Query => Err(SourceError::Unavailable {
                source_name: source.to_string(),
                message: "not a .csv, .xlsx or .json file and no query connector is configured"
                    .to_string(),
            }),
        }
    }
}

/// Make header names usable as column names.
///
/// Blank headers become `Unnamed: {position}`; repeated names get `.1`,
/// `.2`, ... suffixes.
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for (position, header) in raw.into_iter().enumerate() {
        let header = header.as_ref().trim();
        let base = if header.is_empty() {
            format!("Unnamed: {}", position)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PipelineError};

    #[test]
    fn test_detect_kind() {
        assert_eq!(SourceKind::detect("data/ventas.CSV"), SourceKind::Csv);
        assert_eq!(SourceKind::detect("book.xlsx"), SourceKind::Xlsx);
        assert_eq!(SourceKind::detect("rows.json"), SourceKind::Json);
        assert_eq!(SourceKind::detect("SELECT * FROM ventas"), SourceKind::Query);
    }

    #[test]
    fn test_query_is_unavailable() {
        let err = FileLoader.load("SELECT * FROM ventas").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
        assert_eq!(PipelineError::from(err).kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = FileLoader.load("/nonexistent/ventas.csv").unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
        assert_eq!(PipelineError::from(err).kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn test_normalize_headers() {
        assert_eq!(
            normalize_headers(["a", "", "a", "b", "a"]),
            vec!["a", "Unnamed: 1", "a.1", "b", "a.2"]
        );
    }
}
