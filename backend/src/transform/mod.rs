//! Transformation module.
//!
//! - DSL: expressions, conditions and typed stage specs
//! - Stages: derive, filter, aggregate (group or pivot), sort, round
//! - Pipeline: stage ordering and the end-to-end run

pub mod aggregate;
pub mod derive;
pub mod dsl;
pub mod filter;
pub mod pipeline;
pub mod round;
pub mod sort;

pub use aggregate::{aggregate, reduce};
pub use derive::derive;
pub use filter::filter;
pub use pipeline::{execute, run, Plan};
pub use round::{round, round_half_even};
pub use sort::sort;
