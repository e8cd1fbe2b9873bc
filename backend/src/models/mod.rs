//! Domain models for the frames pipeline.
//!
//! - [`Scalar`] - a single cell value (null, boolean, integer, float, text)
//! - [`ScalarKind`] - the kind of a cell, used by type checks
//! - [`Column`] / [`Table`] - the columnar table every stage consumes and produces
//! - [`RowContext`] - name lookup used while evaluating expressions and conditions

mod scalar;
mod table;

pub use scalar::{Scalar, ScalarKind};
pub use table::{Column, RowContext, RowView, Table};
