//! Filter stage: keep the rows matching every condition.

use crate::error::{TransformError, TransformResult};
use crate::models::Table;

use super::dsl::FilterSpec;

/// Keep rows where all conditions hold. An empty spec returns the table
/// untouched; unknown fields fail before any row is read.
pub fn filter(table: Table, spec: &FilterSpec) -> TransformResult<Table> {
    if spec.is_empty() {
        return Ok(table);
    }

    let columns = spec
        .conditions
        .iter()
        .map(|cond| {
            table
                .column_index(&cond.field)
                .ok_or_else(|| TransformError::UnknownField(cond.field.clone()))
        })
        .collect::<TransformResult<Vec<usize>>>()?;

    let mut keep = Vec::with_capacity(table.num_rows());
    for i in 0..table.num_rows() {
        let row = table.row(i);
        let mut retained = true;
        for (cond, &col) in spec.conditions.iter().zip(&columns) {
            if !cond.matches(row.get(col))? {
                retained = false;
                break;
            }
        }
        if retained {
            keep.push(i);
        }
    }

    Ok(table.take_rows(&keep))
}
