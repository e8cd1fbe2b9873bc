//! Writing the final table.
//!
//! # Emission rules
//!
//! | return_base64 | display_mode | destination | stdout payload    | file written |
//! |---------------|--------------|-------------|-------------------|--------------|
//! | yes           | -            | .xlsx       | base64 XLSX bytes | no           |
//! | no            | yes          | any         | console table     | if given     |
//! | no            | no           | given       | none              | yes          |
//! | no            | no           | none        | JSON records      | no           |

pub mod display;
pub mod xlsx;

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{ConfigError, ConfigResult, OutputResult};
use crate::logs::log_success;
use crate::models::Table;

/// Formats a destination can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Json,
}

/// A destination file and its format.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub path: PathBuf,
    pub format: OutputFormat,
}

impl Destination {
    /// Select the format from the file extension.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let path = PathBuf::from(text.trim());
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let format = match extension.as_deref() {
            Some("csv") => OutputFormat::Csv,
            Some("xlsx") => OutputFormat::Xlsx,
            Some("json") => OutputFormat::Json,
            _ => return Err(ConfigError::UnsupportedDestination(text.to_string())),
        };
        Ok(Self { path, format })
    }
}

/// How the result leaves the process.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputOptions {
    pub destination: Option<Destination>,
    pub display_mode: bool,
    pub return_base64: bool,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Emission {
    /// Payload for standard output
    pub stdout: Option<String>,
    /// File written, if any
    pub written: Option<PathBuf>,
}

/// Apply the emission rules.
pub fn emit(table: &Table, options: &OutputOptions) -> OutputResult<Emission> {
    if options.return_base64 {
        let bytes = xlsx::render_xlsx(table)?;
        log_success(format!("Encoded {} XLSX bytes as base64", bytes.len()));
        return Ok(Emission {
            stdout: Some(STANDARD.encode(bytes)),
            written: None,
        });
    }

    let written = match &options.destination {
        Some(destination) => {
            write(table, destination)?;
            Some(destination.path.clone())
        }
        None => None,
    };

    let stdout = if options.display_mode {
        Some(display::render(table))
    } else if written.is_none() {
        Some(render_json(table)?)
    } else {
        None
    };

    Ok(Emission { stdout, written })
}

/// Write `table` to a destination file.
pub fn write(table: &Table, destination: &Destination) -> OutputResult<()> {
    match destination.format {
        OutputFormat::Csv => std::fs::write(&destination.path, render_csv(table)?)?,
        OutputFormat::Xlsx => xlsx::write_xlsx(table, &destination.path)?,
        OutputFormat::Json => std::fs::write(&destination.path, render_json(table)?)?,
    }
    log_success(format!(
        "Wrote {} rows to {}",
        table.num_rows(),
        destination.path.display()
    ));
    Ok(())
}

/// CSV bytes: UTF-8 with BOM, header row, nulls as empty cells.
pub fn render_csv(table: &Table) -> OutputResult<Vec<u8>> {
    let mut buffer = "\u{feff}".as_bytes().to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(table.column_names())?;
        for index in 0..table.num_rows() {
            let row = table.row(index);
            writer.write_record((0..table.num_columns()).map(|c| row.get(c).to_string()))?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

/// JSON array of records; non-ASCII text is kept verbatim.
pub fn render_json(table: &Table) -> OutputResult<String> {
    Ok(serde_json::to_string(&table.to_records())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample() -> Table {
        Table::from_records(&[
            json!({"item": "Ñ", "total": 20, "avg": 2.5}),
            json!({"item": "B", "total": null, "avg": 1.0}),
        ])
        .unwrap()
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("out.CSV").unwrap().format, OutputFormat::Csv);
        assert_eq!(Destination::parse("out.xlsx").unwrap().format, OutputFormat::Xlsx);
        assert_eq!(Destination::parse("out.json").unwrap().format, OutputFormat::Json);
        assert!(matches!(Destination::parse("out.txt"), Err(ConfigError::UnsupportedDestination(_))));
        assert!(Destination::parse("out").is_err());
    }

    #[test]
    fn test_csv_has_bom_and_empty_nulls() {
        let bytes = render_csv(&sample()).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text, "item,total,avg\nÑ,20,2.5\nB,,1.0\n");
    }

    #[test]
    fn test_json_keeps_non_ascii() {
        let text = render_json(&sample()).unwrap();
        assert!(text.contains("\"Ñ\""));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[1], json!({"item": "B", "total": null, "avg": 1.0}));
    }

    #[test]
    fn test_emit_default_is_json() {
        let emission = emit(&sample(), &OutputOptions::default()).unwrap();
        assert_eq!(emission.stdout, Some(render_json(&sample()).unwrap()));
        assert_eq!(emission.written, None);
    }

    #[test]
    fn test_emit_destination_writes_file_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let options = OutputOptions {
            destination: Some(Destination::parse(path.to_str().unwrap()).unwrap()),
            ..Default::default()
        };
        let emission = emit(&sample(), &options).unwrap();
        assert_eq!(emission.stdout, None);
        assert_eq!(emission.written.as_deref(), Some(path.as_path()));
        assert!(std::fs::read(&path).unwrap().starts_with(&[0xEF, 0xBB, 0xBF]));
    }

    #[test]
    fn test_emit_display_also_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let options = OutputOptions {
            destination: Some(Destination::parse(path.to_str().unwrap()).unwrap()),
            display_mode: true,
            ..Default::default()
        };
        let emission = emit(&sample(), &options).unwrap();
        assert!(emission.stdout.unwrap().contains("NaN"));
        assert!(path.exists());
    }

    #[test]
    fn test_emit_base64_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let options = OutputOptions {
            destination: Some(Destination::parse(path.to_str().unwrap()).unwrap()),
            return_base64: true,
            ..Default::default()
        };
        let emission = emit(&sample(), &options).unwrap();
        let bytes = STANDARD.decode(emission.stdout.unwrap()).unwrap();
        // XLSX files are zip archives.
        assert!(bytes.starts_with(b"PK"));
        assert!(!path.exists());
        assert_eq!(emission.written, None);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let destination = Destination::parse("/nonexistent/dir/out.csv").unwrap();
        assert!(write(&sample(), &destination).is_err());
    }
}
