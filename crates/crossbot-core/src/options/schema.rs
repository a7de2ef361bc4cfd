//! Declared option schemas.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Abstract option types understood by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
}

impl OptionType {
    /// Human-readable name used in validation messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// One allowed value for an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: Value,
}

impl OptionChoice {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single declared option of a component.
///
/// Names must be unique within one component's option list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub choices: Option<Vec<OptionChoice>>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
}

impl OptionSchema {
    /// Creates an optional option with no constraints.
    pub fn new(name: impl Into<String>, option_type: OptionType) -> Self {
        Self {
            name: name.into(),
            option_type,
            ..Default::default()
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::String)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Integer)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, OptionType::Boolean)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.choices
            .get_or_insert_with(Vec::new)
            .push(OptionChoice::new(name, value));
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    pub fn min_length(mut self, min: u32) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: u32) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// Returns the first option name declared more than once, if any.
pub fn find_duplicate_name(schema: &[OptionSchema]) -> Option<&str> {
    schema.iter().enumerate().find_map(|(i, opt)| {
        schema[..i]
            .iter()
            .any(|prev| prev.name == opt.name)
            .then_some(opt.name.as_str())
    })
}
