//! XLSX loading: the first worksheet, first row as headers.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};

use super::normalize_headers;
use crate::error::{SourceError, SourceResult};
use crate::logs::log_success;
use crate::models::{Column, Scalar, Table};

pub fn load_xlsx(path: &Path) -> SourceResult<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SourceError::InvalidFormat("workbook contains no sheets".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return Ok(Table::new());
    };
    let headers = normalize_headers(header_row.iter().map(header_text));

    let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (position, column) in values.iter_mut().enumerate() {
            column.push(row.get(position).map(cell_value).unwrap_or(Scalar::Null));
        }
    }

    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, whole_floats_to_int(values)))
        .collect();
    let table = Table::from_columns(columns)?;
    log_success(format!("Read {} rows from sheet '{}'", table.num_rows(), sheet_name));
    Ok(table)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Scalar {
    match cell {
        Data::Empty | Data::Error(_) => Scalar::Null,
        Data::String(s) if s.is_empty() => Scalar::Null,
        Data::String(s) => Scalar::Text(s.clone()),
        Data::Float(f) => Scalar::float(*f),
        Data::Int(i) => Scalar::Int(*i),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::DateTime(dt) => Scalar::float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Text(s.clone()),
    }
}

/// Spreadsheets store every number as a float; a column whose numbers are
/// all whole is read as integers.
fn whole_floats_to_int(values: Vec<Scalar>) -> Vec<Scalar> {
    let whole = values.iter().all(|v| match v {
        Scalar::Float(f) => f.fract() == 0.0 && f.abs() < 9.0e15,
        Scalar::Int(_) | Scalar::Null => true,
        _ => false,
    });
    let any_float = values.iter().any(|v| matches!(v, Scalar::Float(_)));
    if !(whole && any_float) {
        return values;
    }
    values
        .into_iter()
        .map(|v| match v {
            Scalar::Float(f) => Scalar::Int(f as i64),
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_written_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ventas.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "item").unwrap();
        sheet.write_string(0, 1, "qty").unwrap();
        sheet.write_string(0, 2, "price").unwrap();
        sheet.write_string(1, 0, "A").unwrap();
        sheet.write_number(1, 1, 2.0).unwrap();
        sheet.write_number(1, 2, 9.5).unwrap();
        sheet.write_string(2, 0, "B").unwrap();
        sheet.write_number(2, 1, 1.0).unwrap();
        sheet.write_number(2, 2, 20.0).unwrap();
        workbook.save(&path).unwrap();

        let table = load_xlsx(&path).unwrap();
        assert_eq!(
            table.to_records(),
            vec![
                json!({"item": "A", "qty": 2, "price": 9.5}),
                json!({"item": "B", "qty": 1, "price": 20.0}),
            ]
        );
    }

    #[test]
    fn test_blank_cells_are_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "a").unwrap();
        sheet.write_string(0, 2, "c").unwrap();
        sheet.write_number(1, 0, 1.0).unwrap();
        sheet.write_boolean(2, 2, true).unwrap();
        workbook.save(&path).unwrap();

        let table = load_xlsx(&path).unwrap();
        assert_eq!(table.column_names(), vec!["a", "Unnamed: 1", "c"]);
        assert_eq!(table.column("a").unwrap().values, vec![Scalar::Int(1), Scalar::Null]);
        assert_eq!(table.column("c").unwrap().values, vec![Scalar::Null, Scalar::Bool(true)]);
    }

    #[test]
    fn test_not_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(load_xlsx(&path).is_err());
    }
}
