//! Matcher-or-literal values.
//!
//! Matchers are never evaluated here. They are carried to the matching engine as the integration
//! JSON it understands (`{"pact:matcher:type": ..., "value": ...}`), and can be reduced to their
//! example values when a concrete request has to be produced.

use crate::error::Error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MATCHER_TYPE_KEY: &str = "pact:matcher:type";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Matchable {
    Matcher(MatcherSpec),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherSpec {
    #[serde(rename = "pact:matcher:type")]
    pub matcher_type: String,
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl MatcherSpec {
    fn new<S: Into<String>>(matcher_type: S, value: Value) -> Self {
        Self {
            matcher_type: matcher_type.into(),
            value,
            attributes: Map::new(),
        }
    }

    fn with_attribute<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

impl Matchable {
    /// The concrete value this field stands for, with every nested matcher replaced by its
    /// example.
    pub fn example(&self) -> Value {
        match self {
            Matchable::Matcher(spec) => reify(&spec.value),
            Matchable::Literal(value) => reify(value),
        }
    }

    /// The example rendered as plain text, as it would appear in a path, query or header.
    pub fn example_text(&self) -> String {
        match self.example() {
            Value::String(text) => text,
            other => other.to_string(),
        }
    }

    pub fn is_matcher(&self) -> bool {
        matches!(self, Matchable::Matcher(_))
    }
}

impl From<&str> for Matchable {
    fn from(value: &str) -> Self {
        Matchable::Literal(Value::String(value.into()))
    }
}

impl From<String> for Matchable {
    fn from(value: String) -> Self {
        Matchable::Literal(Value::String(value))
    }
}

impl From<Value> for Matchable {
    fn from(value: Value) -> Self {
        Matchable::Literal(value)
    }
}

impl From<MatcherSpec> for Matchable {
    fn from(spec: MatcherSpec) -> Self {
        Matchable::Matcher(spec)
    }
}

/// Matches any value of the same type as `example`.
pub fn like<V: Into<Value>>(example: V) -> Matchable {
    MatcherSpec::new("type", example.into()).into()
}

/// Matches an array whose every element looks like `example`, with at least `min` elements.
pub fn each_like<V: Into<Value>>(example: V, min: usize) -> Matchable {
    let min = min.max(1);
    let examples = vec![example.into(); min];

    MatcherSpec::new("type", Value::Array(examples))
        .with_attribute("min", Value::from(min))
        .into()
}

/// Matches strings against `pattern`. The example must itself match the pattern.
pub fn regex<P: AsRef<str>, S: Into<String>>(pattern: P, example: S) -> Result<Matchable, Error> {
    let pattern = pattern.as_ref();
    let example = example.into();
    let compiled = Regex::new(pattern)
        .map_err(|e| Error::validation(format!("invalid regex '{}': {}", pattern, e)))?;

    if !compiled.is_match(&example) {
        return Err(Error::validation(format!(
            "example '{}' does not match regex '{}'",
            example, pattern
        )));
    }

    Ok(MatcherSpec::new("regex", Value::String(example))
        .with_attribute("regex", Value::String(pattern.into()))
        .into())
}

pub fn integer(example: i64) -> Matchable {
    MatcherSpec::new("integer", Value::from(example)).into()
}

pub fn decimal(example: f64) -> Matchable {
    MatcherSpec::new("decimal", Value::from(example)).into()
}

pub fn boolean(example: bool) -> Matchable {
    MatcherSpec::new("boolean", Value::Bool(example)).into()
}

/// Matches strings containing `value`.
pub fn include<S: Into<String>>(value: S) -> Matchable {
    MatcherSpec::new("include", Value::String(value.into())).into()
}

/// Replaces every matcher object in `value` by its example value.
pub fn reify(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.contains_key(MATCHER_TYPE_KEY) => {
            map.get("value").map(reify).unwrap_or(Value::Null)
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), reify(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(reify).collect()),
        other => other.clone(),
    }
}
