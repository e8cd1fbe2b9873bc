//! # Frames - declarative table pipelines
//!
//! Frames loads a table, runs a fixed sequence of configurable stages over
//! it and emits the result as JSON, CSV, XLSX or a console table.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────┐   ┌────────────┐   ┌────────────────────┐   ┌──────┐   ┌───────┐   ┌──────────┐
//! │  Source  │──▶│ Derive │──▶│ Pre-filter │──▶│ Group or pivot     │──▶│ Sort │──▶│ Round │──▶│  Output  │
//! │ csv/xlsx │   │ (expr) │   │ (cond)     │   │ → post-filter      │   │      │   │       │   │ json/csv │
//! └──────────┘   └────────┘   └────────────┘   └────────────────────┘   └──────┘   └───────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frames::{execute, FileLoader, PipelineConfig};
//!
//! let config = PipelineConfig::from_args(&[
//!     "ventas.csv".into(),
//!     "['item']".into(),
//!     "{'total': 'sum'}".into(),
//!     "{'total': 'qty * price'}".into(),
//! ])?;
//! let emission = execute(&config, &FileLoader)?;
//! println!("{}", emission.stdout.unwrap_or_default());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Scalars and columnar tables
//! - [`config`] - Pipeline options, positional protocol, settings
//! - [`validation`] - JSON Schema checks of the options
//! - [`source`] - Loading CSV, XLSX and JSON sources
//! - [`transform`] - DSLs, stages and the pipeline
//! - [`output`] - CSV, XLSX, JSON and console output
//! - [`logs`] - Log broadcasting

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod validation;

// Boundaries
pub mod output;
pub mod source;

// Transformation
pub mod transform;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ErrorKind, OutputError, PipelineError, PipelineResult, SourceError, Stage,
    TableError, TransformError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Column, Scalar, ScalarKind, Table};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{PipelineConfig, Settings};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use output::{Emission, OutputOptions};
pub use source::{FileLoader, Loader};
pub use transform::{execute, run, Plan};

// =============================================================================
// Re-exports - DSL
// =============================================================================

pub use transform::dsl::{evaluate, matches, operations_description, Comparator, Expr};
