//! Sort stage: stable multi-key ordering, nulls last in both directions.

use std::cmp::Ordering;

use crate::error::{TransformError, TransformResult};
use crate::models::{Scalar, ScalarKind, Table};

use super::dsl::{SortDirection, SortSpec};

pub fn sort(table: Table, spec: &SortSpec) -> TransformResult<Table> {
    if spec.is_empty() {
        return Ok(table);
    }

    let mut keys = Vec::with_capacity(spec.keys.len());
    for key in &spec.keys {
        let column = table
            .column(&key.field)
            .ok_or_else(|| TransformError::UnknownField(key.field.clone()))?;
        check_single_kind(&column.values)?;
        keys.push((&column.values, key.direction));
    }

    let mut order: Vec<usize> = (0..table.num_rows()).collect();
    order.sort_by(|&a, &b| {
        for (values, direction) in &keys {
            let ord = compare_nulls_last(&values[a], &values[b], *direction);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    Ok(table.take_rows(&order))
}

fn compare_nulls_last(a: &Scalar, b: &Scalar, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = a.compare(b).unwrap_or(Ordering::Equal);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

fn check_single_kind(values: &[Scalar]) -> TransformResult<()> {
    let mut seen: Option<ScalarKind> = None;
    for value in values.iter().filter(|v| !v.is_null()) {
        match seen {
            None => seen = Some(value.kind()),
            Some(kind) if kind != value.kind() => {
                return Err(TransformError::type_mismatch("sort", kind, value.kind()));
            }
            _ => {}
        }
    }
    Ok(())
}
