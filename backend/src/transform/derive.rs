//! Derivation stage: add computed columns.
//!
//! Derivations run in spec order, so a later expression sees the columns
//! produced by earlier ones. A derived column whose name already exists
//! replaces that column in place (a warning is logged).

use crate::error::{TransformError, TransformResult};
use crate::logs::{log_info_indent, log_warning};
use crate::models::{Column, Table};

use super::dsl::{Derivation, DeriveSpec};

pub fn derive(mut table: Table, spec: &DeriveSpec) -> TransformResult<Table> {
    for derivation in &spec.derivations {
        let column = compute(&table, derivation).map_err(|source| TransformError::Derivation {
            column: derivation.column.clone(),
            expression: derivation.expression.clone(),
            source: Box::new(source),
        })?;

        if table.set_column(column)? {
            log_warning(format!(
                "Derived column '{}' overwrites an existing column",
                derivation.column
            ));
        } else {
            log_info_indent(format!("{} = {}", derivation.column, derivation.expression), 1);
        }
    }
    Ok(table)
}

fn compute(table: &Table, derivation: &Derivation) -> TransformResult<Column> {
    if let Some(missing) = derivation
        .expr
        .fields()
        .into_iter()
        .find(|name| !table.has_column(name))
    {
        return Err(TransformError::UnknownField(missing.to_string()));
    }

    let values = (0..table.num_rows())
        .map(|i| derivation.expr.eval(&table.row(i)))
        .collect::<TransformResult<Vec<_>>>()?;

    Ok(Column::new(derivation.column.clone(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Scalar;
    use serde_json::json;

    fn spec(value: serde_json::Value) -> DeriveSpec {
        DeriveSpec::from_json(value.as_object().unwrap()).unwrap()
    }

    fn table() -> Table {
        Table::from_records(&[
            json!({"a": 1, "x": 100}),
            json!({"a": 5, "x": 100}),
        ])
        .unwrap()
    }

    #[test]
    fn test_later_derivation_sees_fresh_column() {
        let out = derive(table(), &spec(json!({"x": "a * 2", "y": "x + 1"}))).unwrap();
        assert_eq!(out.column("x").unwrap().values, vec![Scalar::Int(2), Scalar::Int(10)]);
        assert_eq!(out.column("y").unwrap().values, vec![Scalar::Int(3), Scalar::Int(11)]);
        assert_eq!(out.column_names(), vec!["a", "x", "y"]);
    }

    #[test]
    fn test_unknown_identifier_names_derivation() {
        let err = derive(table(), &spec(json!({"t": "a * missing"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField);
        match err {
            TransformError::Derivation { column, expression, .. } => {
                assert_eq!(column, "t");
                assert_eq!(expression, "a * missing");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch_surfaces() {
        let t = Table::from_records(&[json!({"s": "a", "n": 1})]).unwrap();
        let err = derive(t, &spec(json!({"bad": "s * n"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_empty_table_gets_empty_column() {
        let t = Table::from_columns(vec![Column::new("a", vec![])]).unwrap();
        let out = derive(t, &spec(json!({"b": "a + 1"}))).unwrap();
        assert_eq!(out.column_names(), vec!["a", "b"]);
        assert_eq!(out.num_rows(), 0);
    }
}
