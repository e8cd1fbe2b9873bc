//! Stage orchestration.
//!
//! ```text
//! load → derive → pre-filter → [aggregate → post-filter] → sort → round → emit
//! ```
//!
//! The post-filter only runs when an aggregation ran. Every stage fails fast:
//! the first error aborts the run and nothing is emitted.
//!
//! # Example
//!
//! ```rust,ignore
//! use frames::config::PipelineConfig;
//! use frames::source::FileLoader;
//! use frames::transform::pipeline::execute;
//!
//! let config = PipelineConfig::from_json(r#"{"source": "ventas.csv"}"#)?;
//! let emission = execute(&config, &FileLoader)?;
//! if let Some(payload) = emission.stdout {
//!     println!("{}", payload);
//! }
//! ```

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::Table;
use crate::output::{emit, Emission};
use crate::source::Loader;

use super::aggregate::aggregate;
use super::derive::derive;
use super::dsl::{AggregationSpec, DeriveSpec, FilterSpec, SortSpec};
use super::filter::filter;
use super::round::round;
use super::sort::sort;

/// The compiled, typed stage options of one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    pub derive: DeriveSpec,
    pub pre_filter: FilterSpec,
    pub aggregation: AggregationSpec,
    pub post_filter: FilterSpec,
    pub sort: SortSpec,
    /// Decimal places for float columns; 0 skips rounding
    pub decimals: u32,
}

/// Run every stage of `plan` over `table`.
pub fn run(table: Table, plan: &Plan) -> PipelineResult<Table> {
    let mut table = table;

    if !plan.derive.is_empty() {
        log_info(format!("Deriving {} column(s)", plan.derive.derivations.len()));
        table = derive(table, &plan.derive).map_err(PipelineError::stage(Stage::Derive))?;
    }

    if !plan.pre_filter.is_empty() {
        let before = table.num_rows();
        table = filter(table, &plan.pre_filter).map_err(PipelineError::stage(Stage::PreFilter))?;
        log_info(format!("Pre-filter kept {} of {} rows", table.num_rows(), before));
    }

    if plan.aggregation.is_active() {
        let before = table.num_rows();
        table = aggregate(table, &plan.aggregation).map_err(PipelineError::stage(Stage::Aggregate))?;
        let mode = match plan.aggregation {
            AggregationSpec::Pivot(_) => "Pivot",
            _ => "Grouping",
        };
        log_info(format!("{} reduced {} rows to {}", mode, before, table.num_rows()));

        if !plan.post_filter.is_empty() {
            let before = table.num_rows();
            table = filter(table, &plan.post_filter).map_err(PipelineError::stage(Stage::PostFilter))?;
            log_info(format!("Post-filter kept {} of {} rows", table.num_rows(), before));
        }
    } else if !plan.post_filter.is_empty() {
        log_warning("post_filter ignored: no grouping or pivot was requested");
    }

    if !plan.sort.is_empty() {
        table = sort(table, &plan.sort).map_err(PipelineError::stage(Stage::Sort))?;
    }

    if plan.decimals > 0 {
        table = round(table, plan.decimals);
    }

    Ok(table)
}

/// Plan, load, run and emit.
///
/// Configuration is compiled before the source is touched, so a bad option
/// never costs a load.
pub fn execute(config: &PipelineConfig, loader: &dyn Loader) -> PipelineResult<Emission> {
    let plan = config.plan()?;
    let options = config.output_options()?;

    log_info(format!("Loading '{}'", config.source));
    let table = loader.load(&config.source)?;
    log_success(format!(
        "Loaded {} rows, {} columns",
        table.num_rows(),
        table.num_columns()
    ));

    let result = run(table, &plan)?;
    let emission = emit(&result, &options)?;
    log_success(format!("Pipeline finished with {} rows", result.num_rows()));
    Ok(emission)
}
