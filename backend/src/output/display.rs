//! Console rendering.
//!
//! ```text
//!    item  total
//! 0     A     20
//! 1     B    NaN
//! ```

use crate::models::{Scalar, Table};

fn cell_text(value: &Scalar) -> String {
    match value {
        Scalar::Null => "NaN".to_string(),
        other => other.to_string(),
    }
}

/// Right-aligned text table with a leading row index.
pub fn render(table: &Table) -> String {
    if table.is_empty() {
        return format!(
            "Empty table\nColumns: [{}]\nRows: []",
            table.column_names().join(", ")
        );
    }

    let rows = table.num_rows();
    let index: Vec<String> = (0..rows).map(|i| i.to_string()).collect();
    let index_width = index.iter().map(|s| s.chars().count()).max().unwrap_or(0);

    let cells: Vec<Vec<String>> = table
        .columns()
        .iter()
        .map(|c| c.values.iter().map(cell_text).collect())
        .collect();
    let widths: Vec<usize> = table
        .columns()
        .iter()
        .zip(&cells)
        .map(|(column, values)| {
            values
                .iter()
                .map(|v| v.chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows + 1);

    let mut header = " ".repeat(index_width);
    for (column, width) in table.columns().iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", column.name, width = width));
    }
    lines.push(header);

    for (row, label) in index.iter().enumerate() {
        let mut line = format!("{:<width$}", label, width = index_width);
        for (values, width) in cells.iter().zip(&widths) {
            line.push_str(&format!("  {:>width$}", values[row], width = width));
        }
        lines.push(line);
    }

    lines.join("\n")
}
