//! Columnar in-memory table.

use serde_json::{Map, Value};

use super::scalar::Scalar;
use crate::error::TableError;

/// A named column of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Name-to-value lookup used by the expression and condition evaluators.
pub trait RowContext {
    fn field(&self, name: &str) -> Option<&Scalar>;
}

impl RowContext for std::collections::HashMap<String, Scalar> {
    fn field(&self, name: &str) -> Option<&Scalar> {
        self.get(name)
    }
}

/// An ordered sequence of equally long, uniquely named columns.
///
/// Every constructor and mutator checks both invariants, so a `Table` value
/// is always well-formed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table without columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from columns, checking names and lengths.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Build a table from JSON record objects.
    ///
    /// Column order follows the first appearance of each key; keys missing
    /// from a record are null.
    pub fn from_records(records: &[Value]) -> Result<Self, TableError> {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            if let Some(obj) = record.as_object() {
                for key in obj.keys() {
                    if !names.iter().any(|n| n == key) {
                        names.push(key.clone());
                    }
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(&name).map(Scalar::from_json).unwrap_or(Scalar::Null))
                    .collect();
                Column { name, values }
            })
            .collect();

        Table::from_columns(columns)
    }

    /// Serialize as an array of record objects, keys in column order.
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.num_rows())
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .map(|c| (c.name.clone(), c.values[row].to_json()))
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn row(&self, index: usize) -> RowView<'_> {
        RowView { table: self, index }
    }

    /// Append a new column.
    pub fn push_column(&mut self, column: Column) -> Result<(), TableError> {
        if self.has_column(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }
        self.check_length(&column)?;
        self.columns.push(column);
        Ok(())
    }

    /// Insert or replace a column; an existing column keeps its position.
    ///
    /// Returns `true` when an existing column was overwritten.
    pub fn set_column(&mut self, column: Column) -> Result<bool, TableError> {
        match self.column_index(&column.name) {
            Some(idx) => {
                if self.columns.len() > 1 {
                    self.check_length(&column)?;
                }
                self.columns[idx] = column;
                Ok(true)
            }
            None => {
                self.push_column(column)?;
                Ok(false)
            }
        }
    }

    /// Consume the table, keeping the given rows in the given order.
    pub fn take_rows(self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column {
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
                name: c.name,
            })
            .collect();
        Table { columns }
    }

    /// Replace every value through `f`; names and lengths are unchanged.
    pub fn map_values(self, mut f: impl FnMut(Scalar) -> Scalar) -> Table {
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column {
                values: c.values.into_iter().map(&mut f).collect(),
                name: c.name,
            })
            .collect();
        Table { columns }
    }

    fn check_length(&self, column: &Column) -> Result<(), TableError> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let expected = self.num_rows();
        if column.values.len() != expected {
            return Err(TableError::LengthMismatch {
                column: column.name.clone(),
                expected,
                found: column.values.len(),
            });
        }
        Ok(())
    }
}

/// A borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowView<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: usize) -> &'a Scalar {
        &self.table.columns[column].values[self.index]
    }
}

impl RowContext for RowView<'_> {
    fn field(&self, name: &str) -> Option<&Scalar> {
        self.table
            .column(name)
            .map(|c| &c.values[self.index])
    }
}
