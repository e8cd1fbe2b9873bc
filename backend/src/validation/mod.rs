//! JSON Schema validation for pipeline options.
//!
//! Every structured option is checked against a JSON Schema (Draft 7)
//! before it is compiled into a typed stage spec. Schema violations are
//! reported all at once; the typed compilation that follows only has to
//! deal with semantic problems (unknown comparator, bad expression, ...).
//!
//! # Embedded Schemas
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `group_fields.json`
//! - `aggregate_map.json`
//! - `derive_map.json`
//! - `filter.json` (pre and post filters)
//! - `sort.json`
//! - `pivot.json`
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use frames::validation::{validate_option, OptionSchema};
//!
//! assert!(validate_option(OptionSchema::Filter, &json!({"total": [">", 15]})).is_ok());
//! assert!(validate_option(OptionSchema::Sort, &json!({"total": "up"})).is_err());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every violation otherwise
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use frames::validation::validate;
///
/// let schema = json!({
///     "type": "object",
///     "additionalProperties": { "type": "string" }
/// });
///
/// assert!(validate(&schema, &json!({ "x": "a * 2" })).is_ok());
/// assert!(validate(&schema, &json!({ "x": 2 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick boolean check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// The option schemas shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSchema {
    GroupFields,
    AggregateMap,
    DeriveMap,
    Filter,
    Sort,
    Pivot,
}

fn embedded(text: &str) -> Value {
    serde_json::from_str(text).expect("Invalid embedded schema")
}

static GROUP_FIELDS: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/group_fields.json")));
static AGGREGATE_MAP: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/aggregate_map.json")));
static DERIVE_MAP: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/derive_map.json")));
static FILTER: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/filter.json")));
static SORT: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/sort.json")));
static PIVOT: Lazy<Value> = Lazy::new(|| embedded(include_str!("../../schemas/pivot.json")));

impl OptionSchema {
    pub fn schema(&self) -> &'static Value {
        match self {
            OptionSchema::GroupFields => &GROUP_FIELDS,
            OptionSchema::AggregateMap => &AGGREGATE_MAP,
            OptionSchema::DeriveMap => &DERIVE_MAP,
            OptionSchema::Filter => &FILTER,
            OptionSchema::Sort => &SORT,
            OptionSchema::Pivot => &PIVOT,
        }
    }
}

/// Validate one option value against its embedded schema.
pub fn validate_option(schema: OptionSchema, data: &Value) -> Result<(), Vec<String>> {
    validate(schema.schema(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_schemas_compile() {
        for schema in [
            OptionSchema::GroupFields,
            OptionSchema::AggregateMap,
            OptionSchema::DeriveMap,
            OptionSchema::Filter,
            OptionSchema::Sort,
            OptionSchema::Pivot,
        ] {
            assert!(jsonschema::draft7::new(schema.schema()).is_ok(), "{:?}", schema);
        }
    }

    #[test]
    fn test_filter_schema() {
        assert!(validate_option(OptionSchema::Filter, &json!({"a": ["==", "X"], "b": ["in", [1, 2]]})).is_ok());
        assert!(validate_option(OptionSchema::Filter, &json!({"a": "X"})).is_err());
        assert!(validate_option(OptionSchema::Filter, &json!({"a": ["=="]})).is_err());
        assert!(validate_option(OptionSchema::Filter, &json!({"a": [3, "X"]})).is_err());
    }

    #[test]
    fn test_aggregate_and_group_schemas() {
        assert!(validate_option(OptionSchema::AggregateMap, &json!({"p": ["sum", "mean"], "q": "max"})).is_ok());
        assert!(validate_option(OptionSchema::AggregateMap, &json!({"p": []})).is_err());
        assert!(validate_option(OptionSchema::GroupFields, &json!(["a", "b"])).is_ok());
        assert!(validate_option(OptionSchema::GroupFields, &json!(["a", "a"])).is_err());
    }

    #[test]
    fn test_sort_schema_directions() {
        assert!(validate_option(OptionSchema::Sort, &json!({"a": "ASC", "b": "desc"})).is_ok());
        assert!(validate_option(OptionSchema::Sort, &json!({"a": "up"})).is_err());
    }

    #[test]
    fn test_pivot_schema() {
        assert!(validate_option(OptionSchema::Pivot, &json!({"index": "r", "columns": ["m"], "aggfunc": {"s": "sum"}, "fill_value": 0})).is_ok());
        assert!(validate_option(OptionSchema::Pivot, &json!({"columns": "m"})).is_err());
        assert!(validate_option(OptionSchema::Pivot, &json!({"index": "r", "dropna": false})).is_err());
    }

    #[test]
    fn test_collects_every_error() {
        let errors = validate_option(OptionSchema::DeriveMap, &json!({"a": 1, "b": 2})).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(&json!({"type": "string"}), &json!("x")));
        assert!(!is_valid(&json!({"type": "string"}), &json!(1)));
    }
}
