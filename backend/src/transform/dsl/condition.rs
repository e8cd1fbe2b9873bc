//! Filter conditions: `{field: [comparator, operand]}`.
//!
//! | Comparator | Operand | Applies to |
//! |---|---|---|
//! | `==` (`=`), `!=` | scalar or `None` | any value |
//! | `>`, `<`, `>=`, `<=` | scalar | number vs number, text vs text |
//! | `in`, `not in` | list or set | any value |
//! | `contains`, `startswith`, `endswith` | text | text values only |
//!
//! A null value only matches an explicit null check: `== None`, or `in`
//! with a set holding `None`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult, TransformError, TransformResult};
use crate::models::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
}

impl FromStr for Comparator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        let comparator = match normalized.as_str() {
            "==" | "=" => Comparator::Eq,
            "!=" => Comparator::Ne,
            ">" => Comparator::Gt,
            "<" => Comparator::Lt,
            ">=" => Comparator::Ge,
            "<=" => Comparator::Le,
            "in" => Comparator::In,
            "not in" => Comparator::NotIn,
            "contains" => Comparator::Contains,
            "startswith" => Comparator::StartsWith,
            "endswith" => Comparator::EndsWith,
            _ => return Err(ConfigError::UnknownComparator(s.to_string())),
        };
        Ok(comparator)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::In => "in",
            Comparator::NotIn => "not in",
            Comparator::Contains => "contains",
            Comparator::StartsWith => "startswith",
            Comparator::EndsWith => "endswith",
        };
        f.write_str(text)
    }
}

impl Comparator {
    fn is_ordering(self) -> bool {
        matches!(self, Comparator::Gt | Comparator::Lt | Comparator::Ge | Comparator::Le)
    }

    fn is_text(self) -> bool {
        matches!(
            self,
            Comparator::Contains | Comparator::StartsWith | Comparator::EndsWith
        )
    }

    fn is_membership(self) -> bool {
        matches!(self, Comparator::In | Comparator::NotIn)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Scalar),
    Set(Vec<Scalar>),
}

/// A single `field comparator operand` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparator: Comparator,
    pub operand: Operand,
}

impl Condition {
    pub fn new(field: impl Into<String>, comparator: Comparator, operand: Operand) -> Self {
        Self {
            field: field.into(),
            comparator,
            operand,
        }
    }

    /// Build from the wire form `[comparator, operand]`, checking that the
    /// operand suits the comparator.
    pub fn from_json(option: &str, field: &str, spec: &Value) -> ConfigResult<Self> {
        let pair = spec
            .as_array()
            .filter(|items| items.len() == 2)
            .ok_or_else(|| {
                ConfigError::invalid(
                    option,
                    format!("condition for '{}' must be [comparator, value], got {}", field, spec),
                )
            })?;

        let comparator_text = pair[0].as_str().ok_or_else(|| {
            ConfigError::invalid(option, format!("comparator for '{}' must be text", field))
        })?;
        let comparator: Comparator = comparator_text.parse()?;
        let raw = &pair[1];

        let operand = if comparator.is_membership() {
            let items = raw.as_array().ok_or_else(|| {
                ConfigError::invalid(
                    option,
                    format!("'{}' on '{}' needs a list of values", comparator, field),
                )
            })?;
            Operand::Set(items.iter().map(Scalar::from_json).collect())
        } else if comparator.is_text() {
            match raw {
                Value::String(s) => Operand::Scalar(Scalar::Text(s.clone())),
                _ => {
                    return Err(ConfigError::invalid(
                        option,
                        format!("'{}' on '{}' needs a text value", comparator, field),
                    ))
                }
            }
        } else {
            match raw {
                Value::Array(_) | Value::Object(_) => {
                    return Err(ConfigError::invalid(
                        option,
                        format!("'{}' on '{}' needs a single value", comparator, field),
                    ))
                }
                other => Operand::Scalar(Scalar::from_json(other)),
            }
        };

        Ok(Condition::new(field, comparator, operand))
    }

    /// Test one value of `self.field`.
    pub fn matches(&self, value: &Scalar) -> TransformResult<bool> {
        matches(value, self.comparator, &self.operand)
    }
}

/// Evaluate `value comparator operand`.
pub fn matches(value: &Scalar, comparator: Comparator, operand: &Operand) -> TransformResult<bool> {
    match operand {
        Operand::Set(items) => Ok(match comparator {
            Comparator::In => items.iter().any(|item| value.loose_eq(item)),
            Comparator::NotIn => !value.is_null() && !items.iter().any(|item| value.loose_eq(item)),
            _ => false,
        }),
        Operand::Scalar(target) => match comparator {
            Comparator::Eq => Ok(value.loose_eq(target)),
            Comparator::Ne => Ok(!value.is_null() && !value.loose_eq(target)),
            Comparator::Contains | Comparator::StartsWith | Comparator::EndsWith => {
                let (Some(text), Some(needle)) = (value.as_str(), target.as_str()) else {
                    return Ok(false);
                };
                Ok(match comparator {
                    Comparator::Contains => text.contains(needle),
                    Comparator::StartsWith => text.starts_with(needle),
                    _ => text.ends_with(needle),
                })
            }
            ordering if ordering.is_ordering() => {
                if value.is_null() {
                    return Ok(false);
                }
                let comparable = (value.is_numeric() && target.is_numeric())
                    || (value.as_str().is_some() && target.as_str().is_some());
                let order = value
                    .compare(target)
                    .filter(|_| comparable)
                    .ok_or_else(|| {
                        TransformError::type_mismatch(ordering.to_string(), value.kind(), target.kind())
                    })?;
                Ok(match ordering {
                    Comparator::Gt => order == Ordering::Greater,
                    Comparator::Lt => order == Ordering::Less,
                    Comparator::Ge => order != Ordering::Less,
                    _ => order != Ordering::Greater,
                })
            }
            _ => Ok(false),
        },
    }
}

/// Markdown description of the comparators, for the CLI.
pub fn comparators_description() -> String {
    r#"Filter comparators ({field: [comparator, value]}, all entries ANDed):

| Comparator | Value | Description |
|------------|-------|-------------|
| == (or =) | scalar or None | Equal; numbers compare across int/float |
| != | scalar or None | Not equal; null values never match |
| > < >= <= | scalar | Ordering; number vs number or text vs text |
| in | list/set | Value is one of the listed values |
| not in | list/set | Value is none of the listed values |
| contains | text | Text value contains the substring |
| startswith | text | Text value starts with the prefix |
| endswith | text | Text value ends with the suffix |"#
        .to_string()
}
