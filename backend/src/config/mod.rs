//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds the twelve pipeline options in raw form. It can
//! be built three ways:
//!
//! - [`PipelineConfig::from_args`] - the positional argument protocol
//!   (`source group_fields aggregate_map derive_map destination pivot_spec
//!   display_mode decimals return_base64 pre_filter sort_spec post_filter`),
//!   structured values written as Python literals;
//! - [`PipelineConfig::from_json`] - a JSON document with the same names;
//! - a struct literal.
//!
//! [`PipelineConfig::plan`] then compiles the options into a typed
//! [`Plan`], failing before any data is read.
//!
//! [`Settings`] carries process-level settings read from the environment.

mod literal;

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

pub use literal::parse_literal;

use crate::error::{ConfigError, ConfigResult};
use crate::logs::log_warning;
use crate::output::{Destination, OutputFormat, OutputOptions};
use crate::transform::dsl::{AggregationSpec, DeriveSpec, FilterSpec, GroupSpec, PivotSpec, SortSpec};
use crate::transform::pipeline::Plan;
use crate::validation::{validate_option, OptionSchema};

/// Positional argument names, in protocol order.
pub const POSITIONAL_OPTIONS: [&str; 12] = [
    "source",
    "group_fields",
    "aggregate_map",
    "derive_map",
    "destination",
    "pivot_spec",
    "display_mode",
    "decimals",
    "return_base64",
    "pre_filter",
    "sort_spec",
    "post_filter",
];

/// Raw pipeline options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Query text or file path (required)
    pub source: String,
    /// Fields to group by
    #[serde(deserialize_with = "one_or_many")]
    pub group_fields: Vec<String>,
    /// field -> function name (or list of names)
    pub aggregate_map: Map<String, Value>,
    /// new column -> expression
    pub derive_map: Map<String, Value>,
    /// Output file (.csv, .xlsx, .json)
    pub destination: Option<String>,
    /// Pivot options; takes precedence over grouping
    pub pivot_spec: Option<Value>,
    /// Readable console table instead of JSON
    pub display_mode: bool,
    /// Decimal places for float columns (0 = no rounding)
    pub decimals: u32,
    /// Print the .xlsx destination as base64
    pub return_base64: bool,
    /// Filter before aggregation
    pub pre_filter: Map<String, Value>,
    /// field -> "asc" | "desc"
    pub sort_spec: Map<String, Value>,
    /// Filter after aggregation; ignored when no aggregation runs
    pub post_filter: Map<String, Value>,
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(field)) => vec![field],
        Some(OneOrMany::Many(fields)) => fields,
    })
}

/// `None` when the argument is missing, empty or the text `None`.
fn present(args: &[String], position: usize) -> Option<&str> {
    args.get(position)
        .map(|a| a.trim())
        .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("none"))
}

fn flag(text: Option<&str>) -> bool {
    text.map(|t| matches!(t.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn decimals_from(text: Option<&str>) -> u32 {
    let Some(text) = text else {
        return 0;
    };
    match text.parse::<f64>() {
        Ok(d) if d.is_finite() && d >= 0.0 => d.trunc().min(u32::MAX as f64) as u32,
        _ => {
            log_warning(format!("Invalid decimals '{}', using 0", text));
            0
        }
    }
}

impl PipelineConfig {
    /// Build from positional arguments (program name excluded).
    pub fn from_args(args: &[String]) -> ConfigResult<Self> {
        let source = present(args, 0).ok_or(ConfigError::MissingSource)?.to_string();

        let literal = |position: usize| -> ConfigResult<Option<Value>> {
            present(args, position)
                .map(|text| parse_literal(POSITIONAL_OPTIONS[position], text))
                .transpose()
                .map(|v| v.filter(|v| !v.is_null()))
        };
        let mapping = |position: usize| -> ConfigResult<Map<String, Value>> {
            match literal(position)? {
                None => Ok(Map::new()),
                Some(Value::Object(map)) => Ok(map),
                Some(other) => Err(ConfigError::invalid(
                    POSITIONAL_OPTIONS[position],
                    format!("expected a dict, got {}", other),
                )),
            }
        };

        let group_fields = match literal(1)? {
            None => Vec::new(),
            Some(Value::String(field)) => vec![field],
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(ConfigError::invalid(
                        "group_fields",
                        format!("field names must be text, got {}", other),
                    )),
                })
                .collect::<ConfigResult<Vec<_>>>()?,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "group_fields",
                    format!("expected a field name or a list, got {}", other),
                ))
            }
        };

        Ok(Self {
            source,
            group_fields,
            aggregate_map: mapping(2)?,
            derive_map: mapping(3)?,
            destination: present(args, 4).map(str::to_string),
            pivot_spec: literal(5)?,
            display_mode: flag(present(args, 6)),
            decimals: decimals_from(present(args, 7)),
            return_base64: flag(present(args, 8)),
            pre_filter: mapping(9)?,
            sort_spec: mapping(10)?,
            post_filter: mapping(11)?,
        })
    }

    /// Build from a JSON document.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Whether a pivot was requested (`{}` counts as absent).
    pub fn has_pivot(&self) -> bool {
        match &self.pivot_spec {
            None | Some(Value::Null) => false,
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Check every structured option against its schema.
    ///
    /// A pivot takes precedence over grouping, so the group options are not
    /// checked when a pivot is present.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::MissingSource);
        }

        let mut checks: Vec<(&str, OptionSchema, Value)> = vec![
            ("derive_map", OptionSchema::DeriveMap, Value::Object(self.derive_map.clone())),
            ("pre_filter", OptionSchema::Filter, Value::Object(self.pre_filter.clone())),
            ("sort_spec", OptionSchema::Sort, Value::Object(self.sort_spec.clone())),
            ("post_filter", OptionSchema::Filter, Value::Object(self.post_filter.clone())),
        ];
        if let (true, Some(pivot)) = (self.has_pivot(), &self.pivot_spec) {
            checks.push(("pivot_spec", OptionSchema::Pivot, pivot.clone()));
        } else {
            checks.push(("group_fields", OptionSchema::GroupFields, json!(self.group_fields)));
            checks.push(("aggregate_map", OptionSchema::AggregateMap, Value::Object(self.aggregate_map.clone())));
        }

        for (option, schema, value) in checks {
            validate_option(schema, &value).map_err(|errors| ConfigError::Schema {
                option: option.to_string(),
                errors,
            })?;
        }
        Ok(())
    }

    /// Compile the stage options.
    pub fn plan(&self) -> ConfigResult<Plan> {
        self.validate()?;

        let aggregation = if self.has_pivot() {
            if !self.group_fields.is_empty() || !self.aggregate_map.is_empty() {
                log_warning("Both pivot_spec and group_fields/aggregate_map given; pivot takes precedence");
            }
            let pivot = self.pivot_spec.as_ref().unwrap_or(&Value::Null);
            AggregationSpec::Pivot(PivotSpec::from_json(pivot)?)
        } else if !self.group_fields.is_empty() || !self.aggregate_map.is_empty() {
            AggregationSpec::Group(GroupSpec::new(self.group_fields.clone(), &self.aggregate_map)?)
        } else {
            AggregationSpec::None
        };

        Ok(Plan {
            derive: DeriveSpec::from_json(&self.derive_map)?,
            pre_filter: FilterSpec::from_json("pre_filter", &self.pre_filter)?,
            aggregation,
            post_filter: FilterSpec::from_json("post_filter", &self.post_filter)?,
            sort: SortSpec::from_json(&self.sort_spec)?,
            decimals: self.decimals,
        })
    }

    /// Compile the output options.
    pub fn output_options(&self) -> ConfigResult<OutputOptions> {
        let destination = self.destination.as_deref().map(Destination::parse).transpose()?;

        if self.return_base64 {
            let is_xlsx = destination
                .as_ref()
                .map(|d| d.format == OutputFormat::Xlsx)
                .unwrap_or(false);
            if !is_xlsx {
                return Err(ConfigError::invalid(
                    "return_base64",
                    "requires an .xlsx destination",
                ));
            }
        }

        Ok(OutputOptions {
            destination,
            display_mode: self.display_mode,
            return_base64: self.return_base64,
        })
    }

    /// A complete example configuration.
    pub fn example() -> Self {
        let object = |value: Value| value.as_object().cloned().unwrap_or_default();
        Self {
            source: "ventas.csv".to_string(),
            group_fields: vec!["descripcion".to_string()],
            aggregate_map: object(json!({"total": "sum", "cantidad": ["sum", "mean"]})),
            derive_map: object(json!({"total": "precio * cantidad"})),
            destination: None,
            pivot_spec: None,
            display_mode: false,
            decimals: 2,
            return_base64: false,
            pre_filter: object(json!({"descripcion": ["startswith", "REMERA"]})),
            sort_spec: object(json!({"total": "desc"})),
            post_filter: object(json!({"total": [">", 1000]})),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Process settings (environment, after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Error log file; `None` disables it
    pub log_file: Option<PathBuf>,
    /// Echo log entries to stderr
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: Some(PathBuf::from("frames.log")),
            verbose: false,
        }
    }
}

impl Settings {
    /// Read `FRAMES_LOG_FILE` and `FRAMES_VERBOSE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let log_file = match lookup("FRAMES_LOG_FILE") {
            None => Some(PathBuf::from("frames.log")),
            Some(path) if path.trim().is_empty() || path.trim().eq_ignore_ascii_case("none") => None,
            Some(path) => Some(PathBuf::from(path.trim())),
        };
        Self {
            log_file,
            verbose: flag(lookup("FRAMES_VERBOSE").as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::error::PipelineError;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_args_full_protocol() {
        let config = PipelineConfig::from_args(&args(&[
            "ventas.csv",
            "['descripcion']",
            "{'total': 'sum'}",
            "{'total': 'precio * cantidad'}",
            "None",
            "None",
            "TRUE",
            "2.0",
            "no",
            "{'precio': ['>', 100]}",
            "{'total': 'desc'}",
            "{'total': ['>', 15]}",
        ]))
        .unwrap();

        assert_eq!(config.source, "ventas.csv");
        assert_eq!(config.group_fields, vec!["descripcion"]);
        assert_eq!(config.aggregate_map["total"], json!("sum"));
        assert_eq!(config.destination, None);
        assert!(config.display_mode);
        assert_eq!(config.decimals, 2);
        assert!(!config.return_base64);
        assert_eq!(config.post_filter["total"], json!([">", 15]));
    }

    #[test]
    fn test_from_args_defaults() {
        let config = PipelineConfig::from_args(&args(&["query"])).unwrap();
        assert_eq!(config, PipelineConfig { source: "query".into(), ..Default::default() });
        assert!(matches!(PipelineConfig::from_args(&[]), Err(ConfigError::MissingSource)));
    }

    #[test]
    fn test_invalid_decimals_fall_back_to_zero() {
        let config = PipelineConfig::from_args(&args(&["a.csv", "", "", "", "", "", "", "dos"])).unwrap();
        assert_eq!(config.decimals, 0);
        let config = PipelineConfig::from_args(&args(&["a.csv", "", "", "", "", "", "", "-1"])).unwrap();
        assert_eq!(config.decimals, 0);
    }

    #[test]
    fn test_from_args_rejects_wrong_shapes() {
        let err = PipelineConfig::from_args(&args(&["a.csv", "", "['a']"])).unwrap_err();
        assert!(err.to_string().contains("aggregate_map"));
        assert!(PipelineConfig::from_args(&args(&["a.csv", "{'a': }"])).is_err());
    }

    #[test]
    fn test_from_json() {
        let config = PipelineConfig::from_json(
            r#"{"source": "a.json", "group_fields": "item", "aggregate_map": {"total": "sum"}}"#,
        )
        .unwrap();
        assert_eq!(config.group_fields, vec!["item"]);
        assert!(PipelineConfig::from_json(r#"{"source": "a", "unknown": 1}"#).is_err());
    }

    #[test]
    fn test_plan_selects_aggregation() {
        let group = PipelineConfig {
            source: "a".into(),
            group_fields: vec!["item".into()],
            aggregate_map: json!({"total": "sum"}).as_object().cloned().unwrap(),
            ..Default::default()
        };
        assert!(matches!(group.plan().unwrap().aggregation, AggregationSpec::Group(_)));

        let both = PipelineConfig {
            pivot_spec: Some(json!({"index": "item"})),
            ..group.clone()
        };
        assert!(matches!(both.plan().unwrap().aggregation, AggregationSpec::Pivot(_)));

        let none = PipelineConfig { source: "a".into(), ..Default::default() };
        assert_eq!(none.plan().unwrap().aggregation, AggregationSpec::None);
    }

    #[test]
    fn test_plan_errors_are_config_errors() {
        let bad_func = PipelineConfig {
            source: "a".into(),
            group_fields: vec!["item".into()],
            aggregate_map: json!({"total": "mode"}).as_object().cloned().unwrap(),
            ..Default::default()
        };
        let err: PipelineError = bad_func.plan().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAggregate);

        let no_map = PipelineConfig {
            source: "a".into(),
            group_fields: vec!["item".into()],
            ..Default::default()
        };
        assert!(no_map.plan().is_err());

        let bad_filter = PipelineConfig {
            source: "a".into(),
            pre_filter: json!({"a": ["~", 1]}).as_object().cloned().unwrap(),
            ..Default::default()
        };
        assert!(matches!(bad_filter.plan(), Err(ConfigError::UnknownComparator(_))));

        let bad_schema = PipelineConfig {
            source: "a".into(),
            sort_spec: json!({"a": 1}).as_object().cloned().unwrap(),
            ..Default::default()
        };
        assert!(matches!(bad_schema.plan(), Err(ConfigError::Schema { ref option, .. }) if option == "sort_spec"));
    }

    #[test]
    fn test_output_options() {
        let base = PipelineConfig { source: "a".into(), ..Default::default() };
        let b64_csv = PipelineConfig {
            destination: Some("out.csv".into()),
            return_base64: true,
            ..base.clone()
        };
        assert!(b64_csv.output_options().is_err());

        let b64_xlsx = PipelineConfig {
            destination: Some("out.xlsx".into()),
            return_base64: true,
            ..base.clone()
        };
        assert!(b64_xlsx.output_options().unwrap().return_base64);

        let bad_ext = PipelineConfig { destination: Some("out.txt".into()), ..base };
        assert!(matches!(bad_ext.output_options(), Err(ConfigError::UnsupportedDestination(_))));
    }

    #[test]
    fn test_example_plans() {
        assert!(PipelineConfig::example().plan().is_ok());
    }

    #[test]
    fn test_settings_lookup() {
        let settings = Settings::from_lookup(|key| match key {
            "FRAMES_LOG_FILE" => Some("none".into()),
            "FRAMES_VERBOSE" => Some("yes".into()),
            _ => None,
        });
        assert_eq!(settings, Settings { log_file: None, verbose: true });
        assert_eq!(Settings::from_lookup(|_| None), Settings::default());
    }
}
