//! Rounding stage.
//!
//! Floats are rounded half-to-even on `value * 10^decimals`. Integers, text,
//! booleans and nulls pass through.

use crate::models::{Scalar, Table};

pub fn round(table: Table, decimals: u32) -> Table {
    table.map_values(|value| match value {
        Scalar::Float(f) => Scalar::float(round_half_even(f, decimals)),
        other => other,
    })
}

pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.min(308) as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}
