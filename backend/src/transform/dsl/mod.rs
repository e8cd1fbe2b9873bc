//! The two embedded mini-languages and the typed stage specs.
//!
//! - `lexer` / `expr`: derived-column expressions (`qty * price`)
//! - `condition`: filter predicates (`{'total': ['>', 15]}`)
//! - `spec`: typed filter, derive, sort, group and pivot specs
//!
//! ## Usage Flow
//!
//! ```text
//! raw option (JSON) → spec::*::from_json → typed spec → stage(table, &spec) → table
//! ```

pub mod condition;
pub mod expr;
pub mod lexer;
pub mod spec;

pub use condition::{comparators_description, matches, Comparator, Condition, Operand};
pub use expr::{evaluate, BinaryOp, Expr};
pub use spec::{
    AggFunc, AggregateEntry, AggregationSpec, DeriveSpec, Derivation, FilterSpec, GroupSpec,
    PivotAggFunc, PivotSpec, SortDirection, SortKey, SortSpec,
};

/// Markdown reference of everything the pipeline options accept.
pub fn operations_description() -> String {
    let mut out = comparators_description();

    out.push_str(
        r#"

Derived-column expressions (derive_map {name: expression}):

| Syntax | Description |
|--------|-------------|
| + - * / | Arithmetic; int stays int except for / |
| ( ) | Grouping |
| -x | Negation |
| 'text' "text" | Text literal; + concatenates text |
| name or `name with spaces` | Column reference |

Division by zero yields null; null operands yield null.

Aggregate functions (aggregate_map {field: function or [functions]}, pivot aggfunc):

| Function | Description |
|----------|-------------|
"#,
    );

    for func in AggFunc::ALL {
        out.push_str(&format!("| {} | {} |\n", func.name(), func.description()));
    }

    out
}
