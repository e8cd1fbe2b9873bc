//! Typed stage specifications.
//!
//! Each spec is compiled from its raw JSON option once, before any data is
//! loaded, so that malformed options fail as configuration errors.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::condition::Condition;
use super::expr::Expr;
use crate::error::{ConfigError, ConfigResult};
use crate::models::Scalar;

// =============================================================================
// Filter
// =============================================================================

/// Conjunction of conditions; empty means identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSpec {
    pub conditions: Vec<Condition>,
}

impl FilterSpec {
    pub fn from_json(option: &str, map: &Map<String, Value>) -> ConfigResult<Self> {
        let conditions = map
            .iter()
            .map(|(field, spec)| Condition::from_json(option, field, spec))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { conditions })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

// =============================================================================
// Derivation
// =============================================================================

/// One derived column: its name, its source text and the parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub column: String,
    pub expression: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeriveSpec {
    pub derivations: Vec<Derivation>,
}

impl DeriveSpec {
    pub fn from_json(map: &Map<String, Value>) -> ConfigResult<Self> {
        let mut derivations = Vec::with_capacity(map.len());
        for (column, raw) in map {
            let expression = raw.as_str().ok_or_else(|| {
                ConfigError::invalid(
                    "derive_map",
                    format!("expression for '{}' must be text", column),
                )
            })?;
            let expr = Expr::parse(expression)
                .map_err(|e| ConfigError::invalid("derive_map", e.to_string()))?;
            derivations.push(Derivation {
                column: column.clone(),
                expression: expression.to_string(),
                expr,
            });
        }
        Ok(Self { derivations })
    }

    pub fn is_empty(&self) -> bool {
        self.derivations.is_empty()
    }
}

// =============================================================================
// Sort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ConfigError::invalid(
                "sort_spec",
                format!("unknown direction '{}', expected 'asc' or 'desc'", s),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Sort keys in priority order; empty means unsorted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortSpec {
    pub keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn from_json(map: &Map<String, Value>) -> ConfigResult<Self> {
        let keys = map
            .iter()
            .map(|(field, raw)| {
                let text = raw.as_str().ok_or_else(|| {
                    ConfigError::invalid("sort_spec", format!("direction for '{}' must be text", field))
                })?;
                Ok(SortKey {
                    field: field.clone(),
                    direction: text.parse()?,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// =============================================================================
// Aggregate functions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Sum,
    Mean,
    Median,
    Count,
    Size,
    Min,
    Max,
    Std,
    Var,
    Prod,
    First,
    Last,
    NUnique,
}

impl AggFunc {
    pub const ALL: [AggFunc; 13] = [
        AggFunc::Sum,
        AggFunc::Mean,
        AggFunc::Median,
        AggFunc::Count,
        AggFunc::Size,
        AggFunc::Min,
        AggFunc::Max,
        AggFunc::Std,
        AggFunc::Var,
        AggFunc::Prod,
        AggFunc::First,
        AggFunc::Last,
        AggFunc::NUnique,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Mean => "mean",
            AggFunc::Median => "median",
            AggFunc::Count => "count",
            AggFunc::Size => "size",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Std => "std",
            AggFunc::Var => "var",
            AggFunc::Prod => "prod",
            AggFunc::First => "first",
            AggFunc::Last => "last",
            AggFunc::NUnique => "nunique",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AggFunc::Sum => "Sum of values (0 when empty)",
            AggFunc::Mean => "Arithmetic mean (aliases: avg, average)",
            AggFunc::Median => "Median value",
            AggFunc::Count => "Number of non-null values",
            AggFunc::Size => "Number of rows, nulls included",
            AggFunc::Min => "Smallest value (numbers, text or booleans)",
            AggFunc::Max => "Largest value (numbers, text or booleans)",
            AggFunc::Std => "Sample standard deviation",
            AggFunc::Var => "Sample variance",
            AggFunc::Prod => "Product of values (alias: product)",
            AggFunc::First => "First non-null value",
            AggFunc::Last => "Last non-null value",
            AggFunc::NUnique => "Number of distinct non-null values",
        }
    }
}

impl FromStr for AggFunc {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let func = match s.trim().to_lowercase().as_str() {
            "sum" => AggFunc::Sum,
            "mean" | "avg" | "average" => AggFunc::Mean,
            "median" => AggFunc::Median,
            "count" => AggFunc::Count,
            "size" => AggFunc::Size,
            "min" => AggFunc::Min,
            "max" => AggFunc::Max,
            "std" => AggFunc::Std,
            "var" => AggFunc::Var,
            "prod" | "product" => AggFunc::Prod,
            "first" => AggFunc::First,
            "last" => AggFunc::Last,
            "nunique" => AggFunc::NUnique,
            _ => return Err(ConfigError::UnsupportedAggregate(s.to_string())),
        };
        Ok(func)
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_functions(option: &str, field: &str, raw: &Value) -> ConfigResult<Vec<AggFunc>> {
    match raw {
        Value::String(name) => Ok(vec![name.parse()?]),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| {
                        ConfigError::invalid(option, format!("functions for '{}' must be text", field))
                    })?
                    .parse()
            })
            .collect(),
        other => Err(ConfigError::invalid(
            option,
            format!("'{}' needs a function name or a list of names, got {}", field, other),
        )),
    }
}

// =============================================================================
// Group
// =============================================================================

/// Aggregates computed for one source field.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateEntry {
    pub field: String,
    pub functions: Vec<AggFunc>,
}

impl AggregateEntry {
    /// Output column names: the field itself for a single function,
    /// `{field}_{function}` otherwise.
    pub fn output_names(&self) -> Vec<String> {
        if self.functions.len() == 1 {
            vec![self.field.clone()]
        } else {
            self.functions
                .iter()
                .map(|f| format!("{}_{}", self.field, f.name()))
                .collect()
        }
    }
}

/// Group-by fields plus aggregates. No fields means one whole-table row.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub fields: Vec<String>,
    pub aggregates: Vec<AggregateEntry>,
}

impl GroupSpec {
    pub fn new(fields: Vec<String>, aggregate_map: &Map<String, Value>) -> ConfigResult<Self> {
        if aggregate_map.is_empty() {
            return Err(ConfigError::invalid(
                "aggregate_map",
                "group_fields requires an aggregate_map",
            ));
        }
        let aggregates = aggregate_map
            .iter()
            .map(|(field, raw)| {
                Ok(AggregateEntry {
                    field: field.clone(),
                    functions: parse_functions("aggregate_map", field, raw)?,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { fields, aggregates })
    }
}

// =============================================================================
// Pivot
// =============================================================================

/// Aggregate function selection for a pivot.
#[derive(Debug, Clone, PartialEq)]
pub enum PivotAggFunc {
    All(AggFunc),
    PerValue(Vec<(String, AggFunc)>),
}

/// Pivot-table options (`index`, `columns`, `values`, `aggfunc`,
/// `fill_value`, `margins`, `margins_name`).
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSpec {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    /// `None` selects every numeric column outside `index` and `columns`.
    pub values: Option<Vec<String>>,
    pub aggfunc: PivotAggFunc,
    pub fill_value: Scalar,
    pub margins: bool,
    pub margins_name: String,
}

const PIVOT_KEYS: [&str; 7] = [
    "index",
    "columns",
    "values",
    "aggfunc",
    "fill_value",
    "margins",
    "margins_name",
];

impl PivotSpec {
    pub fn from_json(raw: &Value) -> ConfigResult<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| ConfigError::invalid("pivot_spec", "expected a mapping of pivot options"))?;

        if let Some(unknown) = obj.keys().find(|k| !PIVOT_KEYS.contains(&k.as_str())) {
            return Err(ConfigError::invalid(
                "pivot_spec",
                format!("unknown pivot option '{}'", unknown),
            ));
        }

        let index = field_list(obj.get("index"), "index")?;
        if index.is_empty() {
            return Err(ConfigError::invalid("pivot_spec", "'index' is required"));
        }
        let columns = field_list(obj.get("columns"), "columns")?;
        let mut values = match obj.get("values") {
            None | Some(Value::Null) => None,
            Some(v) => Some(field_list(Some(v), "values")?),
        };

        let aggfunc = match obj.get("aggfunc") {
            None | Some(Value::Null) => PivotAggFunc::All(AggFunc::Mean),
            Some(Value::String(name)) => PivotAggFunc::All(name.parse()?),
            Some(Value::Object(map)) => {
                let per_value = map
                    .iter()
                    .map(|(field, f)| {
                        let name = f.as_str().ok_or_else(|| {
                            ConfigError::invalid(
                                "pivot_spec",
                                format!("aggfunc for '{}' must be a function name", field),
                            )
                        })?;
                        Ok((field.clone(), name.parse()?))
                    })
                    .collect::<ConfigResult<Vec<(String, AggFunc)>>>()?;
                let fields: Vec<String> = per_value.iter().map(|(f, _)| f.clone()).collect();
                match &values {
                    None => values = Some(fields),
                    Some(explicit) => {
                        if let Some(missing) = explicit.iter().find(|v| !fields.contains(v)) {
                            return Err(ConfigError::invalid(
                                "pivot_spec",
                                format!("no aggfunc given for value '{}'", missing),
                            ));
                        }
                    }
                }
                PivotAggFunc::PerValue(per_value)
            }
            Some(other) => {
                return Err(ConfigError::invalid(
                    "pivot_spec",
                    format!("aggfunc must be a name or a mapping, got {}", other),
                ))
            }
        };

        let fill_value = obj.get("fill_value").map(Scalar::from_json).unwrap_or(Scalar::Null);

        let margins = match obj.get("margins") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "pivot_spec",
                    format!("margins must be a boolean, got {}", other),
                ))
            }
        };

        let margins_name = match obj.get("margins_name") {
            None | Some(Value::Null) => "All".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(ConfigError::invalid(
                    "pivot_spec",
                    format!("margins_name must be text, got {}", other),
                ))
            }
        };

        Ok(Self {
            index,
            columns,
            values,
            aggfunc,
            fill_value,
            margins,
            margins_name,
        })
    }

    /// Aggregate function applied to `value`.
    pub fn aggfunc_for(&self, value: &str) -> AggFunc {
        match &self.aggfunc {
            PivotAggFunc::All(f) => *f,
            PivotAggFunc::PerValue(map) => map
                .iter()
                .find(|(field, _)| field == value)
                .map(|(_, f)| *f)
                .unwrap_or(AggFunc::Mean),
        }
    }
}

fn field_list(raw: Option<&Value>, key: &str) -> ConfigResult<Vec<String>> {
    match raw {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigError::invalid("pivot_spec", format!("'{}' entries must be field names", key))
                })
            })
            .collect(),
        Some(other) => Err(ConfigError::invalid(
            "pivot_spec",
            format!("'{}' must be a field name or a list of names, got {}", key, other),
        )),
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// The aggregation mode of a run; group and pivot are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AggregationSpec {
    #[default]
    None,
    Group(GroupSpec),
    Pivot(PivotSpec),
}

impl AggregationSpec {
    pub fn is_active(&self) -> bool {
        !matches!(self, AggregationSpec::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_agg_func_aliases() {
        assert_eq!("AVG".parse::<AggFunc>().unwrap(), AggFunc::Mean);
        assert_eq!("product".parse::<AggFunc>().unwrap(), AggFunc::Prod);
        assert!(matches!(
            "mode".parse::<AggFunc>(),
            Err(ConfigError::UnsupportedAggregate(ref name)) if name == "mode"
        ));
    }

    #[test]
    fn test_group_output_names() {
        let spec = GroupSpec::new(
            vec!["item".into()],
            &map(json!({"precio": ["sum", "mean"], "qty": "sum"})),
        )
        .unwrap();
        assert_eq!(spec.aggregates[0].output_names(), vec!["precio_sum", "precio_mean"]);
        assert_eq!(spec.aggregates[1].output_names(), vec!["qty"]);
    }

    #[test]
    fn test_group_requires_aggregates() {
        assert!(GroupSpec::new(vec!["item".into()], &Map::new()).is_err());
    }

    #[test]
    fn test_sort_spec_keeps_order() {
        let spec = SortSpec::from_json(&map(json!({"b": "DESC", "a": "asc"}))).unwrap();
        assert_eq!(spec.keys[0].field, "b");
        assert_eq!(spec.keys[0].direction, SortDirection::Desc);
        assert_eq!(spec.keys[1].direction, SortDirection::Asc);
        assert!(SortSpec::from_json(&map(json!({"a": "up"}))).is_err());
    }

    #[test]
    fn test_derive_spec_parses_once() {
        let spec = DeriveSpec::from_json(&map(json!({"total": "qty * price"}))).unwrap();
        assert_eq!(spec.derivations[0].expr.fields(), vec!["qty", "price"]);
        assert!(DeriveSpec::from_json(&map(json!({"bad": "qty *"}))).is_err());
        assert!(DeriveSpec::from_json(&map(json!({"bad": 3}))).is_err());
    }

    #[test]
    fn test_pivot_defaults() {
        let spec = PivotSpec::from_json(&json!({"index": "region"})).unwrap();
        assert_eq!(spec.index, vec!["region"]);
        assert!(spec.columns.is_empty());
        assert_eq!(spec.values, None);
        assert_eq!(spec.aggfunc, PivotAggFunc::All(AggFunc::Mean));
        assert_eq!(spec.fill_value, Scalar::Null);
        assert_eq!(spec.margins_name, "All");
    }

    #[test]
    fn test_pivot_per_value_aggfunc() {
        let spec = PivotSpec::from_json(&json!({
            "index": ["region"],
            "columns": "month",
            "aggfunc": {"sales": "sum", "units": "max"},
            "fill_value": 0
        }))
        .unwrap();
        assert_eq!(spec.values, Some(vec!["sales".to_string(), "units".to_string()]));
        assert_eq!(spec.aggfunc_for("units"), AggFunc::Max);
        assert_eq!(spec.fill_value, Scalar::Int(0));
    }

    #[test]
    fn test_pivot_rejects_bad_options() {
        assert!(PivotSpec::from_json(&json!({"columns": "m"})).is_err());
        assert!(PivotSpec::from_json(&json!({"index": "r", "dropna": true})).is_err());
        assert!(matches!(
            PivotSpec::from_json(&json!({"index": "r", "aggfunc": "mode"})),
            Err(ConfigError::UnsupportedAggregate(_))
        ));
        assert!(PivotSpec::from_json(&json!({
            "index": "r", "values": ["a", "b"], "aggfunc": {"a": "sum"}
        }))
        .is_err());
    }
}
