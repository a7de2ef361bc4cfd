//! Typed, validated access to an interaction's raw options.

use std::fmt;

use serde_json::Value;

use super::schema::{OptionSchema, OptionType};
use crate::error::{OptionError, OptionResult, OptionViolation, OptionsValidationError};
use crate::interaction::RawOptions;

/// A raw option value coerced to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Coerces a raw JSON value into the declared option type.
///
/// String-sourced values (text commands) are parsed permissively. Returns
/// `None` when the value cannot represent the declared type.
pub fn coerce(raw: &Value, option_type: OptionType) -> Option<OptionValue> {
    match option_type {
        OptionType::String => match raw {
            Value::String(s) => Some(OptionValue::String(s.clone())),
            Value::Number(n) => Some(OptionValue::String(n.to_string())),
            Value::Bool(b) => Some(OptionValue::String(b.to_string())),
            _ => None,
        },
        OptionType::Integer => match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral))
                .map(OptionValue::Integer),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
                    .map(OptionValue::Integer)
            }
            _ => None,
        },
        OptionType::Number => match raw {
            Value::Number(n) => n.as_f64().map(OptionValue::Number),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(OptionValue::Number),
            _ => None,
        },
        OptionType::Boolean => match raw {
            Value::Bool(b) => Some(OptionValue::Boolean(*b)),
            Value::String(s) => parse_bool(s).map(OptionValue::Boolean),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(OptionValue::Boolean(false)),
                Some(1) => Some(OptionValue::Boolean(true)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn render_raw(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read-only view over one dispatch's raw options and the target
/// component's declared schema.
#[derive(Debug, Clone, Default)]
pub struct OptionsHandler {
    raw: RawOptions,
    schema: Vec<OptionSchema>,
}

impl OptionsHandler {
    pub fn new(raw: RawOptions, schema: Vec<OptionSchema>) -> Self {
        Self { raw, schema }
    }

    /// The declared schema.
    pub fn schema(&self) -> &[OptionSchema] {
        &self.schema
    }

    /// The raw value for `name`, declared or not.
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.raw.get(name).filter(|v| !v.is_null())
    }

    fn declared(&self, name: &str) -> Option<&OptionSchema> {
        self.schema.iter().find(|opt| opt.name == name)
    }

    /// The value of a declared option, coerced to its type.
    ///
    /// Returns `None` if the option is undeclared, absent, or malformed.
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        let opt = self.declared(name)?;
        coerce(self.raw(name)?, opt.option_type)
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    /// Strict access to a declared option.
    ///
    /// Fails with [`OptionError::Missing`] when a required option is absent
    /// and [`OptionError::Malformed`] when it cannot be coerced; an absent
    /// optional option yields `Ok(None)`.
    pub fn require(&self, name: &str) -> OptionResult<Option<OptionValue>> {
        let opt = self.declared(name).ok_or_else(|| OptionError::Unknown {
            name: name.to_string(),
        })?;

        match self.raw(name) {
            None if opt.required => Err(OptionError::Missing {
                name: name.to_string(),
            }),
            None => Ok(None),
            Some(raw) => coerce(raw, opt.option_type)
                .map(Some)
                .ok_or_else(|| OptionError::Malformed {
                    name: name.to_string(),
                    expected: opt.option_type.describe(),
                    raw: render_raw(raw),
                }),
        }
    }

    /// Validates every declared option, collecting all violations.
    pub fn validate(&self) -> Result<(), OptionsValidationError> {
        let violations: Vec<OptionViolation> = self
            .schema
            .iter()
            .flat_map(|opt| self.check(opt))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(OptionsValidationError { violations })
        }
    }

    /// Every constraint `opt` violates. A missing or malformed value stops
    /// the remaining checks.
    fn check(&self, opt: &OptionSchema) -> Vec<OptionViolation> {
        let name = &opt.name;
        let Some(raw) = self.raw(name) else {
            return if opt.required {
                vec![OptionViolation::Missing { name: name.clone() }]
            } else {
                Vec::new()
            };
        };

        let Some(value) = coerce(raw, opt.option_type) else {
            return vec![OptionViolation::Malformed {
                name: name.clone(),
                expected: opt.option_type.describe(),
                raw: render_raw(raw),
            }];
        };

        let mut violations = Vec::new();

        if let Some(choices) = &opt.choices {
            let allowed = choices
                .iter()
                .filter_map(|c| coerce(&c.value, opt.option_type))
                .any(|c| c == value);
            if !allowed {
                violations.push(OptionViolation::NotAChoice {
                    name: name.clone(),
                    raw: value.to_string(),
                });
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = opt.min_value.filter(|min| n < *min) {
                violations.push(OptionViolation::BelowMinimum {
                    name: name.clone(),
                    min,
                    value: n,
                });
            }
            if let Some(max) = opt.max_value.filter(|max| n > *max) {
                violations.push(OptionViolation::AboveMaximum {
                    name: name.clone(),
                    max,
                    value: n,
                });
            }
        }

        if let OptionValue::String(s) = &value {
            let len = s.chars().count();
            if let Some(min) = opt.min_length.map(|m| m as usize).filter(|min| len < *min) {
                violations.push(OptionViolation::TooShort {
                    name: name.clone(),
                    min,
                    len,
                });
            }
            if let Some(max) = opt.max_length.map(|m| m as usize).filter(|max| len > *max) {
                violations.push(OptionViolation::TooLong {
                    name: name.clone(),
                    max,
                    len,
                });
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> RawOptions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_text_tokens_are_coerced() {
        let handler = OptionsHandler::new(
            raw(&[("count", json!("42")), ("loud", json!("YES"))]),
            vec![OptionSchema::integer("count"), OptionSchema::boolean("loud")],
        );
        assert_eq!(handler.get_integer("count"), Some(42));
        assert_eq!(handler.get_boolean("loud"), Some(true));
    }

    #[test]
    fn test_typed_values_pass_through() {
        let handler = OptionsHandler::new(
            raw(&[("ratio", json!(0.5)), ("name", json!(7))]),
            vec![OptionSchema::number("ratio"), OptionSchema::string("name")],
        );
        assert_eq!(handler.get_number("ratio"), Some(0.5));
        assert_eq!(handler.get_string("name").as_deref(), Some("7"));
    }

    #[test]
    fn test_get_ignores_undeclared_options() {
        let handler = OptionsHandler::new(raw(&[("extra", json!("x"))]), vec![]);
        assert_eq!(handler.get("extra"), None);
        assert_eq!(handler.raw("extra"), Some(&json!("x")));
    }

    #[test]
    fn test_require_distinguishes_missing_and_optional() {
        let handler = OptionsHandler::new(
            RawOptions::new(),
            vec![
                OptionSchema::string("target").required(true),
                OptionSchema::string("reason"),
            ],
        );
        assert_eq!(
            handler.require("target"),
            Err(OptionError::Missing {
                name: "target".into()
            })
        );
        assert_eq!(handler.require("reason"), Ok(None));
        assert!(matches!(
            handler.require("nope"),
            Err(OptionError::Unknown { .. })
        ));
    }

    #[test]
    fn test_require_reports_malformed_value() {
        let handler = OptionsHandler::new(
            raw(&[("count", json!("many"))]),
            vec![OptionSchema::integer("count").required(true)],
        );
        assert_eq!(
            handler.require("count"),
            Err(OptionError::Malformed {
                name: "count".into(),
                expected: "an integer",
                raw: "many".into(),
            })
        );
    }

    #[test]
    fn test_validate_aggregates_every_violation() {
        let handler = OptionsHandler::new(
            raw(&[
                ("count", json!("0")),
                ("name", json!("ab")),
                ("color", json!("green")),
                ("flag", json!("maybe")),
            ]),
            vec![
                OptionSchema::string("target").required(true),
                OptionSchema::integer("count").min_value(1.0),
                OptionSchema::string("name").min_length(3),
                OptionSchema::string("color").choice("Red", "red"),
                OptionSchema::boolean("flag"),
            ],
        );

        let err = handler.validate().unwrap_err();
        let names: Vec<&str> = err.violations.iter().map(OptionViolation::name).collect();
        assert_eq!(names, vec!["target", "count", "name", "color", "flag"]);
        assert!(matches!(err.violations[1], OptionViolation::BelowMinimum { .. }));
        assert!(matches!(err.violations[2], OptionViolation::TooShort { .. }));
        assert!(matches!(err.violations[3], OptionViolation::NotAChoice { .. }));
        assert!(matches!(err.violations[4], OptionViolation::Malformed { .. }));
        assert_eq!(err.to_string().lines().count(), 5);
    }

    #[test]
    fn test_validate_reports_every_constraint_of_one_option() {
        let handler = OptionsHandler::new(
            raw(&[("size", json!("0")), ("tag", json!("x"))]),
            vec![
                OptionSchema::integer("size").choice("Five", 5).min_value(1.0),
                OptionSchema::string("tag").choice("Long", "longer").min_length(3),
            ],
        );

        let err = handler.validate().unwrap_err();
        assert_eq!(
            err.violations,
            vec![
                OptionViolation::NotAChoice {
                    name: "size".into(),
                    raw: "0".into(),
                },
                OptionViolation::BelowMinimum {
                    name: "size".into(),
                    min: 1.0,
                    value: 0.0,
                },
                OptionViolation::NotAChoice {
                    name: "tag".into(),
                    raw: "x".into(),
                },
                OptionViolation::TooShort {
                    name: "tag".into(),
                    min: 3,
                    len: 1,
                },
            ]
        );
    }

    #[test]
    fn test_validate_passes_within_bounds() {
        let handler = OptionsHandler::new(
            raw(&[("count", json!(10)), ("name", json!("abcd"))]),
            vec![
                OptionSchema::integer("count").min_value(1.0).max_value(10.0),
                OptionSchema::string("name").max_length(4),
            ],
        );
        assert!(handler.validate().is_ok());
    }

    #[test]
    fn test_null_counts_as_absent() {
        let handler = OptionsHandler::new(
            raw(&[("target", Value::Null)]),
            vec![OptionSchema::string("target").required(true)],
        );
        assert!(handler.validate().is_err());
        assert_eq!(handler.get("target"), None);
    }
}
