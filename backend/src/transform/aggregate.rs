//! Aggregation stage: group-by or pivot.
//!
//! # Group mode
//!
//! ```text
//! item qty total            item total
//! ┌──┬───┬─────┐            ┌──┬─────┐
//! │A │ 2 │ 20  │            │A │ 20  │
//! │B │ 1 │ 20  │   sum  →   │B │ 20  │
//! └──┴───┴─────┘            └──┴─────┘
//! ```
//!
//! Rows are partitioned by the group fields; partitions appear in order of
//! first appearance. Without group fields the whole table is one partition.
//!
//! # Pivot mode
//!
//! ```text
//! region month sales         region  Jan  Feb
//! ┌─────┬─────┬─────┐        ┌──────┬────┬────┐
//! │North│ Jan │ 10  │        │North │ 10 │ 5  │
//! │North│ Feb │ 5   │   →    │South │ 7  │fill│
//! │South│ Jan │ 7   │        └──────┴────┴────┘
//! └─────┴─────┴─────┘
//! ```
//!
//! Index combinations become rows in first-appearance order. Columns are the
//! cartesian product of each column field's distinct values, so a combination
//! with no rows still gets a column holding the fill value. Rows with a null
//! group, index or column key are dropped. Clashing output names take a `.1`
//! suffix.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{TransformError, TransformResult};
use crate::logs::log_warning;
use crate::models::{Column, Scalar, ScalarKind, Table};

use super::dsl::{AggFunc, AggregationSpec, GroupSpec, PivotSpec};

/// Run the active aggregation, or return the table unchanged.
pub fn aggregate(table: Table, spec: &AggregationSpec) -> TransformResult<Table> {
    match spec {
        AggregationSpec::None => Ok(table),
        AggregationSpec::Group(group) => group_by(&table, group),
        AggregationSpec::Pivot(pivot) => pivot_table(&table, pivot),
    }
}

// =============================================================================
// Partitioning
// =============================================================================

/// Hashable form of a key value; whole floats share the integer's key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
}

impl From<&Scalar> for KeyPart {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Null => KeyPart::Null,
            Scalar::Bool(b) => KeyPart::Bool(*b),
            Scalar::Int(i) => KeyPart::Int(*i),
            Scalar::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    KeyPart::Int(*f as i64)
                } else {
                    KeyPart::Float(f.to_bits())
                }
            }
            Scalar::Text(s) => KeyPart::Text(s.clone()),
        }
    }
}

/// A distinct key combination and the rows holding it.
struct Partition {
    key: Vec<Scalar>,
    rows: Vec<usize>,
}

/// Group `rows` by the values of `columns`, in first-appearance order.
/// Rows with a null in any key column are dropped.
fn partition(columns: &[&Column], rows: impl Iterator<Item = usize>) -> Vec<Partition> {
    let mut lookup: HashMap<Vec<KeyPart>, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    for row in rows {
        if columns.iter().any(|c| c.values[row].is_null()) {
            continue;
        }
        let key: Vec<KeyPart> = columns.iter().map(|c| KeyPart::from(&c.values[row])).collect();
        let slot = *lookup.entry(key).or_insert_with(|| {
            partitions.push(Partition {
                key: columns.iter().map(|c| c.values[row].clone()).collect(),
                rows: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[slot].rows.push(row);
    }

    partitions
}

/// Distinct values of one pivot column field, in first-appearance order.
struct Level {
    values: Vec<Scalar>,
    lookup: HashMap<KeyPart, usize>,
}

impl Level {
    fn observe(column: &Column, rows: &[usize]) -> Self {
        let mut level = Level {
            values: Vec::new(),
            lookup: HashMap::new(),
        };
        for &row in rows {
            let value = &column.values[row];
            if let Entry::Vacant(slot) = level.lookup.entry(KeyPart::from(value)) {
                slot.insert(level.values.len());
                level.values.push(value.clone());
            }
        }
        level
    }

    fn position(&self, value: &Scalar) -> usize {
        self.lookup.get(&KeyPart::from(value)).copied().unwrap_or(0)
    }
}

/// Every combination of the levels' values, first level outermost.
fn cartesian(levels: &[Level]) -> Vec<Vec<Scalar>> {
    levels.iter().fold(vec![Vec::new()], |keys, level| {
        keys.iter()
            .flat_map(|prefix| {
                level.values.iter().map(move |value| {
                    let mut key = prefix.clone();
                    key.push(value.clone());
                    key
                })
            })
            .collect()
    })
}

fn resolve<'a>(table: &'a Table, fields: &[String]) -> TransformResult<Vec<&'a Column>> {
    fields
        .iter()
        .map(|f| {
            table
                .column(f)
                .ok_or_else(|| TransformError::UnknownField(f.clone()))
        })
        .collect()
}

fn key_columns(names: &[String], partitions: &[Partition]) -> Vec<Column> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Column::new(name.clone(), partitions.iter().map(|p| p.key[i].clone()).collect()))
        .collect()
}

/// Suffix repeated column names with `.1`, `.2`, ... The first keeps its name.
fn disambiguate(columns: &mut [Column]) {
    let mut taken: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns.iter_mut() {
        let base = column.name.clone();
        let mut counter = 1;
        while taken.contains(&column.name) {
            column.name = format!("{}.{}", base, counter);
            counter += 1;
        }
        if column.name != base {
            log_warning(format!("Output column '{}' renamed to '{}'", base, column.name));
        }
        taken.push(column.name.clone());
    }
}

// =============================================================================
// Group mode
// =============================================================================

fn group_by(table: &Table, spec: &GroupSpec) -> TransformResult<Table> {
    let group_columns = resolve(table, &spec.fields)?;
    let partitions = if spec.fields.is_empty() {
        vec![Partition {
            key: Vec::new(),
            rows: (0..table.num_rows()).collect(),
        }]
    } else {
        partition(&group_columns, 0..table.num_rows())
    };

    let mut columns = key_columns(&spec.fields, &partitions);

    for entry in &spec.aggregates {
        let source = table
            .column(&entry.field)
            .ok_or_else(|| TransformError::UnknownField(entry.field.clone()))?;
        for (func, name) in entry.functions.iter().zip(entry.output_names()) {
            let values = partitions
                .iter()
                .map(|p| reduce(*func, p.rows.iter().map(|&r| &source.values[r])))
                .collect::<TransformResult<Vec<_>>>()?;
            columns.push(Column::new(name, values));
        }
    }

    disambiguate(&mut columns);
    Ok(Table::from_columns(columns)?)
}

// =============================================================================
// Pivot mode
// =============================================================================

fn pivot_table(table: &Table, spec: &PivotSpec) -> TransformResult<Table> {
    let index_columns = resolve(table, &spec.index)?;
    let header_columns = resolve(table, &spec.columns)?;

    let value_names = match &spec.values {
        Some(values) => values.clone(),
        None => default_values(table, spec),
    };
    let value_columns = resolve(table, &value_names)?;

    // Rows with a null index or column key take no part in the pivot
    let rows: Vec<usize> = (0..table.num_rows())
        .filter(|&r| {
            index_columns
                .iter()
                .chain(&header_columns)
                .all(|c| !c.values[r].is_null())
        })
        .collect();
    let row_keys = partition(&index_columns, rows.iter().copied());

    let levels: Vec<Level> = header_columns
        .iter()
        .map(|c| Level::observe(c, &rows))
        .collect();
    let col_keys = if levels.is_empty() {
        Vec::new()
    } else {
        cartesian(&levels)
    };

    // Row index -> column key slot
    let mut col_of_row = vec![0usize; table.num_rows()];
    for &r in &rows {
        col_of_row[r] = levels
            .iter()
            .zip(&header_columns)
            .fold(0, |slot, (level, column)| {
                slot * level.values.len() + level.position(&column.values[r])
            });
    }

    let labels: Vec<String> = col_keys.iter().map(|k| label(k)).collect();
    let single_value = value_names.len() == 1;
    let column_name = |value: &str, label: &str| {
        if single_value {
            label.to_string()
        } else {
            format!("{}_{}", value, label)
        }
    };

    let mut columns = key_columns(&spec.index, &row_keys);
    if spec.margins {
        for (i, column) in columns.iter_mut().enumerate() {
            let margin = if i == 0 { spec.margins_name.clone() } else { String::new() };
            column.values.push(Scalar::Text(margin));
        }
    }

    for (value_name, value_column) in value_names.iter().zip(&value_columns) {
        let func = spec.aggfunc_for(value_name);
        let cell = |rows: &mut dyn Iterator<Item = usize>| -> TransformResult<Scalar> {
            let mut rows = rows.peekable();
            if rows.peek().is_none() {
                return Ok(spec.fill_value.clone());
            }
            let result = reduce(func, rows.map(|r| &value_column.values[r]))?;
            Ok(if result.is_null() { spec.fill_value.clone() } else { result })
        };

        if col_keys.is_empty() {
            let mut values = row_keys
                .iter()
                .map(|rk| cell(&mut rk.rows.iter().copied()))
                .collect::<TransformResult<Vec<_>>>()?;
            if spec.margins {
                values.push(cell(&mut rows.iter().copied())?);
            }
            columns.push(Column::new(value_name.clone(), values));
            continue;
        }

        for (slot, slot_label) in labels.iter().enumerate() {
            let mut values = row_keys
                .iter()
                .map(|rk| cell(&mut rk.rows.iter().copied().filter(|&r| col_of_row[r] == slot)))
                .collect::<TransformResult<Vec<_>>>()?;
            if spec.margins {
                values.push(cell(&mut rows.iter().copied().filter(|&r| col_of_row[r] == slot))?);
            }
            columns.push(Column::new(column_name(value_name, slot_label), values));
        }

        if spec.margins {
            let mut totals = row_keys
                .iter()
                .map(|rk| cell(&mut rk.rows.iter().copied()))
                .collect::<TransformResult<Vec<_>>>()?;
            totals.push(cell(&mut rows.iter().copied())?);
            columns.push(Column::new(column_name(value_name, &spec.margins_name), totals));
        }
    }

    disambiguate(&mut columns);
    Ok(Table::from_columns(columns)?)
}

/// Numeric columns outside the index and column fields.
fn default_values(table: &Table, spec: &PivotSpec) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| !spec.index.contains(&c.name) && !spec.columns.contains(&c.name))
        .filter(|c| {
            c.values.iter().any(|v| !v.is_null())
                && c.values.iter().all(|v| v.is_null() || v.is_numeric())
        })
        .map(|c| c.name.clone())
        .collect()
}

fn label(key: &[Scalar]) -> String {
    key.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("_")
}

// =============================================================================
// Aggregate functions
// =============================================================================

/// Reduce one partition's values with `func`. Nulls are skipped except by
/// `size`.
pub fn reduce<'a>(func: AggFunc, values: impl Iterator<Item = &'a Scalar>) -> TransformResult<Scalar> {
    let mut total = 0usize;
    let present: Vec<&Scalar> = values
        .inspect(|_| total += 1)
        .filter(|v| !v.is_null())
        .collect();

    match func {
        AggFunc::Size => Ok(Scalar::Int(total as i64)),
        AggFunc::Count => Ok(Scalar::Int(present.len() as i64)),
        AggFunc::NUnique => {
            let mut seen: Vec<KeyPart> = Vec::new();
            for v in &present {
                let key = KeyPart::from(*v);
                if !seen.contains(&key) {
                    seen.push(key);
                }
            }
            Ok(Scalar::Int(seen.len() as i64))
        }
        AggFunc::First => Ok(present.first().map(|v| (*v).clone()).unwrap_or(Scalar::Null)),
        AggFunc::Last => Ok(present.last().map(|v| (*v).clone()).unwrap_or(Scalar::Null)),
        AggFunc::Min | AggFunc::Max => extreme(func, &present),
        AggFunc::Sum | AggFunc::Prod => {
            require_numeric(func, &present)?;
            Ok(fold_exact(func, &present))
        }
        AggFunc::Mean | AggFunc::Median | AggFunc::Std | AggFunc::Var => {
            require_numeric(func, &present)?;
            let nums: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
            Ok(statistic(func, nums))
        }
    }
}

fn require_numeric(func: AggFunc, values: &[&Scalar]) -> TransformResult<()> {
    match values.iter().find(|v| !v.is_numeric()) {
        Some(bad) => Err(TransformError::type_mismatch(func.name(), bad.kind(), ScalarKind::Number)),
        None => Ok(()),
    }
}

/// `sum` / `prod`, staying integral while every input is an integer.
fn fold_exact(func: AggFunc, values: &[&Scalar]) -> Scalar {
    let identity: i64 = if func == AggFunc::Sum { 0 } else { 1 };
    let mut exact: Option<i64> = Some(identity);
    let mut approx: f64 = identity as f64;

    for value in values {
        let f = value.as_f64().unwrap_or(0.0);
        exact = match (exact, value) {
            (Some(acc), Scalar::Int(i)) => {
                if func == AggFunc::Sum {
                    acc.checked_add(*i)
                } else {
                    acc.checked_mul(*i)
                }
            }
            _ => None,
        };
        if func == AggFunc::Sum {
            approx += f;
        } else {
            approx *= f;
        }
    }

    match exact {
        Some(i) => Scalar::Int(i),
        None => Scalar::float(approx),
    }
}

fn statistic(func: AggFunc, mut nums: Vec<f64>) -> Scalar {
    let n = nums.len();
    match func {
        AggFunc::Mean if n > 0 => Scalar::float(nums.iter().sum::<f64>() / n as f64),
        AggFunc::Median if n > 0 => {
            nums.sort_by(|a, b| a.total_cmp(b));
            let mid = n / 2;
            if n % 2 == 1 {
                Scalar::float(nums[mid])
            } else {
                Scalar::float((nums[mid - 1] + nums[mid]) / 2.0)
            }
        }
        AggFunc::Var | AggFunc::Std if n > 1 => {
            let mean = nums.iter().sum::<f64>() / n as f64;
            let var = nums.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            if func == AggFunc::Var {
                Scalar::float(var)
            } else {
                Scalar::float(var.sqrt())
            }
        }
        _ => Scalar::Null,
    }
}

fn extreme(func: AggFunc, values: &[&Scalar]) -> TransformResult<Scalar> {
    let Some(first) = values.first() else {
        return Ok(Scalar::Null);
    };
    let kind = first.kind();
    let mut best: &Scalar = first;
    for value in &values[1..] {
        if value.kind() != kind {
            return Err(TransformError::type_mismatch(func.name(), kind, value.kind()));
        }
        let ord = value.compare(best).unwrap_or(std::cmp::Ordering::Equal);
        let better = match func {
            AggFunc::Min => ord.is_lt(),
            _ => ord.is_gt(),
        };
        if better {
            best = *value;
        }
    }
    Ok(best.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::{json, Value};

    fn group(fields: &[&str], aggregates: Value) -> AggregationSpec {
        AggregationSpec::Group(
            GroupSpec::new(
                fields.iter().map(|s| s.to_string()).collect(),
                aggregates.as_object().unwrap(),
            )
            .unwrap(),
        )
    }

    fn pivot(value: Value) -> AggregationSpec {
        AggregationSpec::Pivot(PivotSpec::from_json(&value).unwrap())
    }

    fn sales() -> Table {
        Table::from_records(&[
            json!({"region": "North", "month": "Jan", "sales": 10, "units": 1}),
            json!({"region": "North", "month": "Feb", "sales": 5, "units": 2}),
            json!({"region": "South", "month": "Jan", "sales": 7, "units": 3}),
            json!({"region": "North", "month": "Jan", "sales": 4, "units": 4}),
        ])
        .unwrap()
    }

    #[test]
    fn test_group_first_appearance_order() {
        let out = aggregate(sales(), &group(&["region"], json!({"sales": "sum"}))).unwrap();
        assert_eq!(
            out.to_records(),
            vec![json!({"region": "North", "sales": 19}), json!({"region": "South", "sales": 7})]
        );
    }

    #[test]
    fn test_group_multiple_functions() {
        let out = aggregate(
            sales(),
            &group(&["region"], json!({"sales": ["sum", "mean"], "units": "max"})),
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["region", "sales_sum", "sales_mean", "units"]);
        assert_eq!(out.column("sales_mean").unwrap().values[1], Scalar::Float(7.0));
        assert_eq!(out.column("units").unwrap().values[0], Scalar::Int(4));
    }

    #[test]
    fn test_whole_table_aggregate() {
        let out = aggregate(sales(), &group(&[], json!({"sales": "sum", "region": "nunique"}))).unwrap();
        assert_eq!(out.to_records(), vec![json!({"sales": 26, "region": 2})]);
    }

    #[test]
    fn test_null_keys_are_dropped() {
        let t = Table::from_records(&[
            json!({"k": null, "v": 1}),
            json!({"k": "a", "v": 2}),
            json!({"k": null, "v": 3}),
        ])
        .unwrap();
        let out = aggregate(t.clone(), &group(&["k"], json!({"v": "sum"}))).unwrap();
        assert_eq!(out.to_records(), vec![json!({"k": "a", "v": 2})]);

        let out = aggregate(t, &group(&[], json!({"v": "sum"}))).unwrap();
        assert_eq!(out.to_records(), vec![json!({"v": 4})]);
    }

    #[test]
    fn test_group_output_name_clash() {
        let out = aggregate(sales(), &group(&["region"], json!({"region": "count"}))).unwrap();
        assert_eq!(out.column_names(), vec!["region", "region.1"]);
        assert_eq!(out.column("region.1").unwrap().values[0], Scalar::Int(3));
    }

    #[test]
    fn test_group_unknown_field_and_type_mismatch() {
        let err = aggregate(sales(), &group(&["nope"], json!({"sales": "sum"}))).unwrap_err();
        assert_eq!(err, TransformError::UnknownField("nope".into()));

        let err = aggregate(sales(), &group(&["region"], json!({"month": "sum"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_pivot_basic_with_fill() {
        let out = aggregate(
            sales(),
            &pivot(json!({"index": "region", "columns": "month", "values": "sales", "aggfunc": "sum", "fill_value": 0})),
        )
        .unwrap();
        assert_eq!(
            out.to_records(),
            vec![
                json!({"region": "North", "Jan": 14, "Feb": 5}),
                json!({"region": "South", "Jan": 7, "Feb": 0}),
            ]
        );
    }

    #[test]
    fn test_pivot_default_values_and_mean() {
        let out = aggregate(sales(), &pivot(json!({"index": "region", "columns": "month"}))).unwrap();
        assert_eq!(
            out.column_names(),
            vec!["region", "sales_Jan", "sales_Feb", "units_Jan", "units_Feb"]
        );
        assert_eq!(out.column("sales_Jan").unwrap().values[0], Scalar::Float(7.0));
        assert_eq!(out.column("units_Feb").unwrap().values[1], Scalar::Null);
    }

    #[test]
    fn test_pivot_margins() {
        let out = aggregate(
            sales(),
            &pivot(json!({
                "index": "region", "columns": "month", "values": "sales",
                "aggfunc": "sum", "margins": true
            })),
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["region", "Jan", "Feb", "All"]);
        assert_eq!(
            out.to_records()[2],
            json!({"region": "All", "Jan": 21, "Feb": 5, "All": 26})
        );
        assert_eq!(out.column("All").unwrap().values[0], Scalar::Int(19));
    }

    #[test]
    fn test_pivot_cartesian_columns() {
        let t = Table::from_records(&[
            json!({"r": "N", "a": "x", "b": "p", "v": 1}),
            json!({"r": "N", "a": "y", "b": "q", "v": 2}),
        ])
        .unwrap();
        let out = aggregate(
            t,
            &pivot(json!({"index": "r", "columns": ["a", "b"], "values": "v", "aggfunc": "sum", "fill_value": 0})),
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["r", "x_p", "x_q", "y_p", "y_q"]);
        assert_eq!(
            out.to_records(),
            vec![json!({"r": "N", "x_p": 1, "x_q": 0, "y_p": 0, "y_q": 2})]
        );
    }

    #[test]
    fn test_pivot_null_keys_are_dropped() {
        let t = Table::from_records(&[
            json!({"r": "N", "m": "Jan", "v": 1}),
            json!({"r": null, "m": "Jan", "v": 2}),
            json!({"r": "N", "m": null, "v": 4}),
            json!({"r": "S", "m": "Feb", "v": 8}),
        ])
        .unwrap();
        let out = aggregate(
            t,
            &pivot(json!({"index": "r", "columns": "m", "values": "v", "aggfunc": "sum", "margins": true})),
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["r", "Jan", "Feb", "All"]);
        assert_eq!(
            out.to_records()[2],
            json!({"r": "All", "Jan": 1, "Feb": 8, "All": 9})
        );
    }

    #[test]
    fn test_pivot_label_clashes() {
        let t = Table::from_records(&[
            json!({"r": "N", "m": 1, "v": 1}),
            json!({"r": "N", "m": "1", "v": 2}),
        ])
        .unwrap();
        let out = aggregate(
            t,
            &pivot(json!({"index": "r", "columns": "m", "values": "v", "aggfunc": "sum"})),
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["r", "1", "1.1"]);
        assert_eq!(out.to_records(), vec![json!({"r": "N", "1": 1, "1.1": 2})]);

        let t = Table::from_records(&[
            json!({"r": "N", "m": "All", "v": 1}),
            json!({"r": "N", "m": "B", "v": 2}),
        ])
        .unwrap();
        let out = aggregate(
            t,
            &pivot(json!({"index": "r", "columns": "m", "values": "v", "aggfunc": "sum", "margins": true})),
        )
        .unwrap();
        assert_eq!(out.column_names(), vec!["r", "All", "B", "All.1"]);
        assert_eq!(
            out.to_records(),
            vec![
                json!({"r": "N", "All": 1, "B": 2, "All.1": 3}),
                json!({"r": "All", "All": 1, "B": 2, "All.1": 3}),
            ]
        );
    }

    #[test]
    fn test_pivot_without_columns() {
        let out = aggregate(
            sales(),
            &pivot(json!({"index": ["region"], "values": ["sales"], "aggfunc": "count"})),
        )
        .unwrap();
        assert_eq!(out.to_records(), vec![json!({"region": "North", "sales": 3}), json!({"region": "South", "sales": 1})]);
    }

    #[test]
    fn test_reduce_semantics() {
        let values = [Scalar::Int(1), Scalar::Null, Scalar::Int(3)];
        let r = |f| reduce(f, values.iter()).unwrap();
        assert_eq!(r(AggFunc::Sum), Scalar::Int(4));
        assert_eq!(r(AggFunc::Count), Scalar::Int(2));
        assert_eq!(r(AggFunc::Size), Scalar::Int(3));
        assert_eq!(r(AggFunc::Mean), Scalar::Float(2.0));
        assert_eq!(r(AggFunc::Median), Scalar::Float(2.0));
        assert_eq!(r(AggFunc::Var), Scalar::Float(2.0));
        assert_eq!(r(AggFunc::Prod), Scalar::Int(3));
        assert_eq!(r(AggFunc::First), Scalar::Int(1));
        assert_eq!(r(AggFunc::Last), Scalar::Int(3));

        let empty: [Scalar; 0] = [];
        assert_eq!(reduce(AggFunc::Sum, empty.iter()).unwrap(), Scalar::Int(0));
        assert_eq!(reduce(AggFunc::Prod, empty.iter()).unwrap(), Scalar::Int(1));
        assert_eq!(reduce(AggFunc::Mean, empty.iter()).unwrap(), Scalar::Null);
        assert_eq!(reduce(AggFunc::Std, [Scalar::Int(1)].iter()).unwrap(), Scalar::Null);
    }

    #[test]
    fn test_min_max_kinds() {
        let words = [Scalar::from("pear"), Scalar::from("apple")];
        assert_eq!(reduce(AggFunc::Min, words.iter()).unwrap(), Scalar::from("apple"));
        let mixed = [Scalar::from("pear"), Scalar::Int(1)];
        assert!(reduce(AggFunc::Max, mixed.iter()).is_err());
        let nums = [Scalar::Int(2), Scalar::Float(2.5)];
        assert_eq!(reduce(AggFunc::Max, nums.iter()).unwrap(), Scalar::Float(2.5));
    }
}
