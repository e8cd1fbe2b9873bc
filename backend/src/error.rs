//! Error types for the frames transformation pipeline.
//!
//! Errors are grouped by the concern that raises them:
//!
//! - [`ConfigError`] - malformed or inconsistent options
//! - [`SourceError`] - loader failures (surfaced as "source unavailable")
//! - [`TransformError`] - stage failures (unknown fields, type mismatches, ...)
//! - [`OutputError`] - writer failures (surfaced as "destination write")
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. Every [`PipelineError`]
//! can be classified with [`PipelineError::kind`].

use std::fmt;

use thiserror::Error;

use crate::models::ScalarKind;

// =============================================================================
// Table Errors
// =============================================================================

/// Violations of the table invariants (unique names, equal column lengths).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// Two columns share a name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column does not have as many values as the table has rows.
    #[error("Column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while reading and compiling pipeline options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source option is missing.
    #[error("Missing source: the source argument cannot be omitted")]
    MissingSource,

    /// A positional argument is not a valid literal.
    #[error("Invalid literal for '{option}': {message}")]
    InvalidLiteral { option: String, message: String },

    /// An option does not match its schema.
    #[error("Invalid '{option}': {}", .errors.join("; "))]
    Schema { option: String, errors: Vec<String> },

    /// An option is well-formed but semantically wrong.
    #[error("Invalid '{option}': {message}")]
    InvalidOption { option: String, message: String },

    /// Comparator not in the supported list.
    #[error("Unknown comparator '{0}'")]
    UnknownComparator(String),

    /// Aggregate function not in the supported list.
    #[error("Unsupported aggregate function '{0}'")]
    UnsupportedAggregate(String),

    /// Destination extension is not .csv, .xlsx or .json.
    #[error("Unsupported destination '{0}': expected a .csv, .xlsx or .json path")]
    UnsupportedDestination(String),

    /// JSON configuration document could not be deserialized.
    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn invalid(option: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while acquiring the initial table.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source kind has no loader (e.g. a query without a connector).
    #[error("Source '{source_name}' is unavailable: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },

    /// Failed to read the file.
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid spreadsheet content.
    #[error("Invalid spreadsheet: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// Invalid JSON content.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally valid file that cannot become a table.
    #[error("Invalid source format: {0}")]
    InvalidFormat(String),

    /// The loaded data violates a table invariant.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by the transformation stages and the two DSLs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Reference to a column absent at that pipeline point.
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    /// Operation between incompatible scalar kinds.
    #[error("Type mismatch in {operation}: {left} and {right}")]
    TypeMismatch {
        operation: String,
        left: ScalarKind,
        right: ScalarKind,
    },

    /// Expression text that does not parse.
    #[error("Invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    /// Failure while computing a derived column.
    #[error("Derived column '{column}' = '{expression}': {source}")]
    Derivation {
        column: String,
        expression: String,
        #[source]
        source: Box<TransformError>,
    },

    /// The stage produced a table violating an invariant.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

impl TransformError {
    pub fn type_mismatch(operation: impl Into<String>, left: ScalarKind, right: ScalarKind) -> Self {
        TransformError::TypeMismatch {
            operation: operation.into(),
            left,
            right,
        }
    }
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing the final table.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to write file.
    #[error("Failed to write destination: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// XLSX serialization failed.
    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON serialization failed.
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),

    /// The table does not fit the target format.
    #[error("Cannot write destination: {0}")]
    Unsupported(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Names of the fallible pipeline stages, used to give failures their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Derive,
    PreFilter,
    Aggregate,
    PostFilter,
    Sort,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Derive => "derive",
            Stage::PreFilter => "pre-filter",
            Stage::Aggregate => "aggregate",
            Stage::PostFilter => "post-filter",
            Stage::Sort => "sort",
        };
        f.write_str(name)
    }
}

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::execute`].
/// The first failure aborts the run; no partial result is emitted.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Loader error.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// A stage failed.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: TransformError,
    },

    /// Writer error.
    #[error("Destination write failed: {0}")]
    DestinationWrite(#[from] OutputError),
}

/// Coarse classification of every pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    TypeMismatch,
    UnknownField,
    UnsupportedAggregate,
    SourceUnavailable,
    DestinationWrite,
}

impl PipelineError {
    pub fn stage(stage: Stage) -> impl FnOnce(TransformError) -> PipelineError {
        move |source| PipelineError::Stage { stage, source }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(ConfigError::UnsupportedAggregate(_)) => {
                ErrorKind::UnsupportedAggregate
            }
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::SourceUnavailable(_) => ErrorKind::SourceUnavailable,
            PipelineError::Stage { source, .. } => source.kind(),
            PipelineError::DestinationWrite(_) => ErrorKind::DestinationWrite,
        }
    }
}

impl TransformError {
    /// Classify this error, looking through derivation context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::UnknownField(_) => ErrorKind::UnknownField,
            TransformError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            TransformError::InvalidExpression { .. } | TransformError::Table(_) => ErrorKind::Config,
            TransformError::Derivation { source, .. } => source.kind(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for loader operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for writer operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
