//! XLSX writing: one worksheet, bold header row, typed cells.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{OutputError, OutputResult};
use crate::models::{Scalar, Table};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

fn build_workbook(table: &Table) -> OutputResult<Workbook> {
    if table.num_rows() + 1 > MAX_ROWS || table.num_columns() > MAX_COLUMNS {
        return Err(OutputError::Unsupported(format!(
            "{} rows x {} columns exceeds the worksheet limits",
            table.num_rows(),
            table.num_columns()
        )));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, column) in table.columns().iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, &column.name, &bold)?;

        for (row, value) in column.values.iter().enumerate() {
            let row = row as u32 + 1;
            match value {
                Scalar::Null => {}
                Scalar::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                Scalar::Int(i) => {
                    worksheet.write_number(row, col, *i as f64)?;
                }
                Scalar::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                Scalar::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    Ok(workbook)
}

/// Render the table as XLSX bytes.
pub fn render_xlsx(table: &Table) -> OutputResult<Vec<u8>> {
    let mut workbook = build_workbook(table)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the table to an XLSX file.
pub fn write_xlsx(table: &Table, path: &Path) -> OutputResult<()> {
    let mut workbook = build_workbook(table)?;
    workbook.save(path)?;
    Ok(())
}
